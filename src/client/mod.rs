//! Consumer side of the proxy: location resolution, the `/api/prayer`
//! client, and the load orchestrator that ties them together.

pub mod api;
pub mod location;
pub mod orchestrator;

pub use api::{PrayerApi, ProxyClient};
pub use location::{FileLocationStore, LocationResolver, ProxyGeolocator};
pub use orchestrator::{LoadState, PrayerTimesController, Selection};
