//! In-memory, time-boxed cache of normalized prayer schedules

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::constants::CACHE_TTL_SECS;
use crate::models::PrayerApiResponse;

/// Identity of one upstream schedule request.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    pub method: u32,
}

impl CacheKey {
    /// Coordinates are rounded to 4 decimals (~11 m) so near-identical
    /// locations share an entry.
    pub fn fingerprint(&self) -> String {
        format!(
            "{:.4}_{:.4}_{}_{}",
            self.latitude, self.longitude, self.date, self.method
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// `None` keeps every entry for the process lifetime
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(CACHE_TTL_SECS),
            max_entries: None,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    response: Arc<PrayerApiResponse>,
    inserted_at: Instant,
}

pub struct PrayerCache {
    entries: DashMap<String, CacheEntry>,
    config: CacheConfig,
}

impl PrayerCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Returns the stored schedule if it is younger than the TTL.
    ///
    /// Stale entries are left in place and overwritten by the next `put`.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<PrayerApiResponse>> {
        let entry = self.entries.get(&key.fingerprint())?;
        if entry.inserted_at.elapsed() < self.config.ttl {
            Some(Arc::clone(&entry.response))
        } else {
            None
        }
    }

    pub fn put(&self, key: &CacheKey, response: Arc<PrayerApiResponse>) {
        let fingerprint = key.fingerprint();
        if let Some(max_entries) = self.config.max_entries {
            if !self.entries.contains_key(&fingerprint) {
                self.make_room(max_entries.max(1));
            }
        }

        self.entries.insert(
            fingerprint,
            CacheEntry {
                response,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn make_room(&self, max_entries: usize) {
        if self.entries.len() < max_entries {
            return;
        }

        let ttl = self.config.ttl;
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);

        while self.entries.len() >= max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.inserted_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
