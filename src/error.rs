use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while fetching a JSON document from a third-party API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("malformed JSON body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            FetchError::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(error.to_string())
        }
    }
}

/// Upstream timings payload did not satisfy the schema contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid response structure from upstream API")]
    InvalidStructure,
    #[error("Missing date fields in upstream API response")]
    MissingDateFields,
    #[error("Missing or invalid timing field: {0}")]
    InvalidTiming(&'static str),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrayerError {
    #[error("Upstream API request failed: {0}")]
    Upstream(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeoIpError {
    #[error("Unable to determine location from IP")]
    Exhausted,
}

/// Why a device position could not be obtained.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

/// Terminal failure of a prayer-times load, as surfaced to presentation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppError {
    #[error("{0}")]
    LocationDenied(String),
    #[error("{0}")]
    ApiFailure(String),
    #[error("{0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Unknown(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::LocationDenied(_) => "LOCATION_DENIED",
            AppError::ApiFailure(_) => "API_FAILURE",
            AppError::InvalidResponse(_) => "INVALID_RESPONSE",
            AppError::Unknown(_) => "UNKNOWN",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::LocationDenied(message)
            | AppError::ApiFailure(message)
            | AppError::InvalidResponse(message)
            | AppError::Unknown(message) => message,
        }
    }
}

impl From<GeolocationError> for AppError {
    fn from(error: GeolocationError) -> Self {
        AppError::LocationDenied(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_serializes_as_tagged_payload() {
        let error = AppError::LocationDenied("Location permission denied".to_string());
        let value = serde_json::to_value(&error).expect("json");
        assert_eq!(value["type"], "LOCATION_DENIED");
        assert_eq!(value["message"], "Location permission denied");
        assert_eq!(error.kind(), "LOCATION_DENIED");
    }

    #[test]
    fn geolocation_errors_map_to_location_denied_with_distinct_messages() {
        let denied = AppError::from(GeolocationError::PermissionDenied);
        let timeout = AppError::from(GeolocationError::Timeout);
        assert_eq!(denied.kind(), "LOCATION_DENIED");
        assert_eq!(timeout.kind(), "LOCATION_DENIED");
        assert_ne!(denied.message(), timeout.message());
    }

    #[test]
    fn prayer_error_exposes_normalizer_message_verbatim() {
        let error = PrayerError::from(NormalizeError::InvalidTiming("Isha"));
        assert_eq!(error.to_string(), "Missing or invalid timing field: Isha");
    }
}
