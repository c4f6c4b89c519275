use std::sync::Arc;

use crate::cache::{CacheConfig, CacheKey, PrayerCache};
use crate::error::PrayerError;
use crate::fetch::JsonFetch;
use crate::methods::MethodProfile;
use crate::models::{Coordinates, PrayerApiResponse};
use crate::normalizer::normalize;

#[derive(Debug, Clone, PartialEq)]
pub struct PrayerQuery {
    pub coordinates: Coordinates,
    /// dd-mm-yyyy
    pub date: String,
    pub method: u32,
}

/// Fetches normalized prayer schedules from the upstream timings API,
/// serving repeated requests from the [`PrayerCache`].
pub struct PrayerService<F> {
    fetcher: F,
    cache: PrayerCache,
    upstream_base: String,
}

impl<F: JsonFetch> PrayerService<F> {
    pub fn new(fetcher: F, upstream_base: impl Into<String>, cache: CacheConfig) -> Self {
        Self {
            fetcher,
            cache: PrayerCache::new(cache),
            upstream_base: upstream_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn prayer_times(
        &self,
        query: &PrayerQuery,
    ) -> Result<Arc<PrayerApiResponse>, PrayerError> {
        let key = CacheKey {
            latitude: query.coordinates.latitude,
            longitude: query.coordinates.longitude,
            date: query.date.clone(),
            method: query.method,
        };

        if let Some(cached) = self.cache.get(&key) {
            tracing::debug!(key = %key.fingerprint(), "prayer cache hit");
            return Ok(cached);
        }

        let url = self.upstream_url(query);
        tracing::info!(key = %key.fingerprint(), "fetching prayer times from upstream");

        let payload = self.fetcher.get_json(&url).await?;
        let response = Arc::new(normalize(&payload, query.method)?);

        self.cache.put(&key, Arc::clone(&response));
        Ok(response)
    }

    pub fn upstream_url(&self, query: &PrayerQuery) -> String {
        format!(
            "{}/timings/{}?latitude={}&longitude={}&{}",
            self.upstream_base,
            query.date,
            query.coordinates.latitude,
            query.coordinates.longitude,
            MethodProfile::for_method(query.method).query()
        )
    }

    pub fn cache(&self) -> &PrayerCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::{json, Value};

    use super::*;
    use crate::error::{FetchError, NormalizeError};

    struct ScriptedFetch {
        responses: Mutex<VecDeque<Result<Value, FetchError>>>,
        urls: Mutex<Vec<String>>,
    }

    impl ScriptedFetch {
        fn with(responses: Vec<Result<Value, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("lock").clone()
        }
    }

    impl JsonFetch for ScriptedFetch {
        async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.urls.lock().expect("lock").push(url.to_string());
            self.responses
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or(Err(FetchError::Transport("no scripted response".to_string())))
        }
    }

    fn upstream_payload(method_id: u32, method_name: &str) -> Value {
        let timings: serde_json::Map<String, Value> = [
            "Fajr", "Sunrise", "Dhuhr", "Asr", "Sunset", "Maghrib", "Isha", "Imsak", "Midnight",
        ]
        .iter()
        .map(|name| (name.to_string(), json!("05:00 (+06)")))
        .collect();

        json!({
            "data": {
                "timings": timings,
                "date": { "hijri": { "day": "1" }, "gregorian": { "date": "01-03-2026" } },
                "meta": { "method": { "id": method_id, "name": method_name } }
            }
        })
    }

    fn query(method: u32) -> PrayerQuery {
        PrayerQuery {
            coordinates: Coordinates {
                latitude: 23.8103,
                longitude: 90.4125,
            },
            date: "01-03-2026".to_string(),
            method,
        }
    }

    #[tokio::test]
    async fn second_request_is_served_from_cache() {
        let fetch = ScriptedFetch::with(vec![Ok(upstream_payload(2, "ISNA"))]);
        let service = PrayerService::new(
            Arc::clone(&fetch),
            "https://up.test/v1/",
            CacheConfig::default(),
        );

        let first = service.prayer_times(&query(2)).await.expect("first");
        let second = service.prayer_times(&query(2)).await.expect("second");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            fetch.urls(),
            vec!["https://up.test/v1/timings/01-03-2026?latitude=23.8103&longitude=90.4125&method=2"]
        );
    }

    #[tokio::test]
    async fn bangladesh_request_uses_custom_profile_and_relabels_meta() {
        let fetch = ScriptedFetch::with(vec![Ok(upstream_payload(99, "Custom"))]);
        let service = PrayerService::new(
            Arc::clone(&fetch),
            "https://up.test/v1",
            CacheConfig::default(),
        );

        let response = service.prayer_times(&query(16)).await.expect("response");

        assert_eq!(response.meta.method.id, 16);
        assert_eq!(response.meta.method.name, "Bangladesh");
        let urls = fetch.urls();
        let url = &urls[0];
        assert!(url.ends_with("&method=99&methodSettings=18,null,18&school=1"), "{url}");
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let fetch = ScriptedFetch::with(vec![
            Err(FetchError::Status(500)),
            Ok(json!({ "data": {} })),
            Ok(upstream_payload(2, "ISNA")),
        ]);
        let service = PrayerService::new(
            Arc::clone(&fetch),
            "https://up.test/v1",
            CacheConfig::default(),
        );

        assert_eq!(
            service.prayer_times(&query(2)).await,
            Err(PrayerError::Upstream(FetchError::Status(500)))
        );
        assert_eq!(
            service.prayer_times(&query(2)).await,
            Err(PrayerError::Normalize(NormalizeError::InvalidStructure))
        );
        assert!(service.cache().is_empty());
        assert!(service.prayer_times(&query(2)).await.is_ok());
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_fetched_again() {
        let fetch = ScriptedFetch::with(vec![
            Ok(upstream_payload(2, "ISNA")),
            Ok(upstream_payload(2, "ISNA")),
        ]);
        let service = PrayerService::new(
            Arc::clone(&fetch),
            "https://up.test/v1",
            CacheConfig::default(),
        );

        let first = service.prayer_times(&query(2)).await.expect("first");
        tokio::time::advance(std::time::Duration::from_secs(3599)).await;
        let cached = service.prayer_times(&query(2)).await.expect("cached");
        assert!(Arc::ptr_eq(&first, &cached));
        assert_eq!(fetch.urls().len(), 1);

        tokio::time::advance(std::time::Duration::from_secs(1)).await;
        let refreshed = service.prayer_times(&query(2)).await.expect("refreshed");

        assert!(!Arc::ptr_eq(&first, &refreshed));
        let urls = fetch.urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], urls[1]);
        assert_eq!(service.cache().len(), 1);
    }
}
