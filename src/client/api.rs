use std::future::Future;

use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use crate::constants::USER_AGENT;
use crate::error::{AppError, FetchError};
use crate::formatters::to_api_date;
use crate::models::{Coordinates, PrayerApiResponse};

/// Source of prayer schedules for the orchestrator.
pub trait PrayerApi: Send + Sync + 'static {
    fn fetch_prayer_times(
        &self,
        coordinates: Coordinates,
        method: u32,
        date: NaiveDate,
    ) -> impl Future<Output = Result<PrayerApiResponse, AppError>> + Send;
}

/// HTTP client for the `/api/prayer` proxy endpoint
#[derive(Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl PrayerApi for ProxyClient {
    async fn fetch_prayer_times(
        &self,
        coordinates: Coordinates,
        method: u32,
        date: NaiveDate,
    ) -> Result<PrayerApiResponse, AppError> {
        let url = format!("{}/api/prayer", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("date", to_api_date(date)),
                ("method", method.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Unknown(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(api_failure(status.as_u16(), &body));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Unknown(e.to_string()))?;
        parse_schedule(body)
    }
}

/// Prefers the proxy's own `{error}` message over the bare status
pub(crate) fn api_failure(status: u16, body: &Value) -> AppError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Server returned {status}"));
    AppError::ApiFailure(message)
}

pub(crate) fn parse_schedule(body: Value) -> Result<PrayerApiResponse, AppError> {
    let invalid = || AppError::InvalidResponse("Received invalid data from server".to_string());

    let has = |key: &str| body.get(key).is_some_and(|value| !value.is_null());
    if !has("timings") || !has("date") {
        return Err(invalid());
    }
    serde_json::from_value(body).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn api_failure_uses_proxy_message_when_present() {
        let error = api_failure(502, &json!({ "error": "Failed to fetch prayer times: boom" }));
        assert_eq!(
            error,
            AppError::ApiFailure("Failed to fetch prayer times: boom".to_string())
        );
        assert_eq!(
            api_failure(500, &Value::Null),
            AppError::ApiFailure("Server returned 500".to_string())
        );
    }

    #[test]
    fn ok_body_without_timings_or_date_is_invalid() {
        let error = parse_schedule(json!({ "date": {} })).expect_err("invalid");
        assert_eq!(error.kind(), "INVALID_RESPONSE");
        assert!(parse_schedule(json!({ "timings": {}, "date": null })).is_err());
    }

    #[test]
    fn serialized_schedule_parses_back() {
        let mut schedule = PrayerApiResponse::default();
        schedule.timings.fajr = "4:55 AM".to_string();
        schedule.meta.method.id = 16;
        let body = serde_json::to_value(&schedule).expect("json");
        assert_eq!(parse_schedule(body), Ok(schedule));
    }
}
