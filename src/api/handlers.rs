use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::AppState;
use crate::constants::PRAYER_CACHE_CONTROL;
use crate::fetch::JsonFetch;
use crate::formatters::{parse_api_date, to_api_date};
use crate::geoip::client_ip;
use crate::models::{Coordinates, ErrorResponse, IpLocation};
use crate::prayer::PrayerQuery;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Raw query string of `/api/prayer`; every field is validated by hand so
/// each failure gets its own message.
#[derive(Debug, Default, Deserialize)]
pub struct PrayerParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub date: Option<String>,
    pub method: Option<String>,
}

pub async fn get_prayer_times<F: JsonFetch>(
    State(state): State<AppState<F>>,
    Query(params): Query<PrayerParams>,
) -> Result<Response, ApiError> {
    let query = validate(&params, state.default_method)?;
    tracing::info!(
        latitude = query.coordinates.latitude,
        longitude = query.coordinates.longitude,
        date = %query.date,
        method = query.method,
        "prayer times requested"
    );

    match state.prayer.prayer_times(&query).await {
        Ok(data) => Ok((
            [(header::CACHE_CONTROL, PRAYER_CACHE_CONTROL)],
            Json(data.as_ref()),
        )
            .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "prayer times request failed");
            Err(error(
                StatusCode::BAD_GATEWAY,
                format!("Failed to fetch prayer times: {}", e),
            ))
        }
    }
}

pub async fn get_location<F: JsonFetch>(
    State(state): State<AppState<F>>,
    headers: HeaderMap,
) -> Result<Json<IpLocation>, ApiError> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());

    state
        .geoip
        .locate(client_ip(forwarded))
        .await
        .map(Json)
        .map_err(|e| error(StatusCode::BAD_GATEWAY, e.to_string()))
}

fn validate(params: &PrayerParams, default_method: u32) -> Result<PrayerQuery, ApiError> {
    let latitude = non_empty(params.latitude.as_deref());
    let longitude = non_empty(params.longitude.as_deref());
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(bad_request("latitude and longitude are required"));
    };

    let (Ok(latitude), Ok(longitude)) = (latitude.parse::<f64>(), longitude.parse::<f64>()) else {
        return Err(bad_request("Invalid latitude or longitude values"));
    };
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(bad_request("Invalid latitude or longitude values"));
    }
    let coordinates = Coordinates::new(latitude, longitude)
        .ok_or_else(|| bad_request("Coordinates out of valid range"))?;

    let date = match non_empty(params.date.as_deref()) {
        Some(raw) => parse_api_date(raw)
            .map(to_api_date)
            .ok_or_else(|| bad_request("Invalid date, expected dd-mm-yyyy"))?,
        None => to_api_date(chrono::Local::now().date_naive()),
    };

    let method = match non_empty(params.method.as_deref()) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| bad_request("Invalid calculation method"))?,
        None => default_method,
    };

    Ok(PrayerQuery {
        coordinates,
        date,
        method,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn bad_request(message: &str) -> ApiError {
    error(StatusCode::BAD_REQUEST, message.to_string())
}

fn error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorResponse { error: message }))
}
