pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::geoip::GeoIpLocator;
use crate::prayer::PrayerService;

pub use routes::create_router;

/// Shared, long-lived state behind every HTTP handler.
pub struct AppState<F> {
    pub prayer: Arc<PrayerService<F>>,
    pub geoip: Arc<GeoIpLocator<F>>,
    pub default_method: u32,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            prayer: Arc::clone(&self.prayer),
            geoip: Arc::clone(&self.geoip),
            default_method: self.default_method,
        }
    }
}
