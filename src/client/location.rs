//! Where the client's coordinates come from: this session, a previous
//! session, or a fresh device fix, in that order.

use std::fs;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

use crate::constants::{
    GEOLOCATION_MAXIMUM_AGE_SECS, GEOLOCATION_TIMEOUT_SECS, LOCATION_STORAGE_KEY,
};
use crate::error::{AppError, FetchError, GeolocationError};
use crate::fetch::JsonFetch;
use crate::models::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// How old a previously obtained fix may be and still be returned
    pub maximum_age: Duration,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(GEOLOCATION_TIMEOUT_SECS),
            maximum_age: Duration::from_secs(GEOLOCATION_MAXIMUM_AGE_SECS),
        }
    }
}

/// A device position provider; the equivalent of a browser location prompt.
pub trait Geolocator: Send + Sync + 'static {
    fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> impl Future<Output = Result<Coordinates, GeolocationError>> + Send;
}

/// Persisted last-known location, last write wins.
pub trait LocationStore: Send + Sync + 'static {
    fn load(&self) -> Option<Coordinates>;
    fn save(&self, coordinates: &Coordinates);
}

// ============================================================================
// File-backed store
// ============================================================================

pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{LOCATION_STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocationStore for FileLocationStore {
    fn load(&self) -> Option<Coordinates> {
        let payload = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str::<Coordinates>(&payload)
            .ok()
            .filter(Coordinates::is_valid)
    }

    fn save(&self, coordinates: &Coordinates) {
        let result = serde_json::to_vec(coordinates)
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error.to_string()))
            .and_then(|payload| write_atomic(&self.path, &payload));
        if let Err(error) = result {
            tracing::warn!(path = %self.path.display(), %error, "failed to persist location");
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "location path must have a parent directory",
        )
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

// ============================================================================
// IP-based geolocator
// ============================================================================

/// Asks the proxy's `/api/location` endpoint for a coarse, IP-derived fix.
pub struct ProxyGeolocator<F> {
    fetcher: F,
    url: String,
    last_fix: Mutex<Option<(Coordinates, Instant)>>,
}

impl<F: JsonFetch> ProxyGeolocator<F> {
    pub fn new(fetcher: F, proxy_url: &str) -> Self {
        Self {
            fetcher,
            url: format!("{}/api/location", proxy_url.trim_end_matches('/')),
            last_fix: Mutex::new(None),
        }
    }

    fn recent_fix(&self, maximum_age: Duration) -> Option<Coordinates> {
        let last_fix = self.last_fix.lock().unwrap_or_else(PoisonError::into_inner);
        last_fix
            .filter(|(_, obtained_at)| obtained_at.elapsed() <= maximum_age)
            .map(|(coordinates, _)| coordinates)
    }
}

impl<F: JsonFetch> Geolocator for ProxyGeolocator<F> {
    async fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> Result<Coordinates, GeolocationError> {
        if let Some(coordinates) = self.recent_fix(options.maximum_age) {
            return Ok(coordinates);
        }
        if options.high_accuracy {
            tracing::debug!("IP geolocation cannot honour high accuracy; returning coarse fix");
        }

        let body = tokio::time::timeout(options.timeout, self.fetcher.get_json(&self.url))
            .await
            .map_err(|_| GeolocationError::Timeout)?
            .map_err(|error| match error {
                FetchError::Status(401 | 403) => GeolocationError::PermissionDenied,
                _ => GeolocationError::PositionUnavailable,
            })?;

        let coordinates = fix_from(&body).ok_or(GeolocationError::PositionUnavailable)?;
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((coordinates, Instant::now()));
        Ok(coordinates)
    }
}

fn fix_from(body: &Value) -> Option<Coordinates> {
    Coordinates::new(
        body.get("latitude")?.as_f64()?,
        body.get("longitude")?.as_f64()?,
    )
}

// ============================================================================
// Resolution strategy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Session,
    Stored,
    Device,
}

pub struct LocationResolver<G, S> {
    geolocator: G,
    store: S,
    options: GeolocationOptions,
    session: Mutex<Option<Coordinates>>,
}

impl<G: Geolocator, S: LocationStore> LocationResolver<G, S> {
    pub fn new(geolocator: G, store: S) -> Self {
        Self::with_options(geolocator, store, GeolocationOptions::default())
    }

    pub fn with_options(geolocator: G, store: S, options: GeolocationOptions) -> Self {
        Self {
            geolocator,
            store,
            options,
            session: Mutex::new(None),
        }
    }

    pub async fn resolve(&self) -> Result<(Coordinates, LocationSource), AppError> {
        let in_session = *self.session();
        if let Some(coordinates) = in_session {
            return Ok((coordinates, LocationSource::Session));
        }

        if let Some(coordinates) = self.store.load() {
            *self.session() = Some(coordinates);
            return Ok((coordinates, LocationSource::Stored));
        }

        let coordinates = self.geolocator.current_position(&self.options).await?;
        if !coordinates.is_valid() {
            return Err(AppError::LocationDenied(
                "Unable to determine your location".to_string(),
            ));
        }

        *self.session() = Some(coordinates);
        self.store.save(&coordinates);
        Ok((coordinates, LocationSource::Device))
    }

    /// Forgets the in-session location so the next resolve starts over
    pub fn clear_session(&self) {
        *self.session() = None;
    }

    fn session(&self) -> std::sync::MutexGuard<'_, Option<Coordinates>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
