use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::constants::{
    ALADHAN_API_BASE, CACHE_TTL_SECS, DEFAULT_BIND, DEFAULT_METHOD, DEFAULT_PROXY_URL,
};

pub const BIND_ENV: &str = "IFTARLY_BIND";
pub const UPSTREAM_URL_ENV: &str = "IFTARLY_UPSTREAM_URL";
pub const CACHE_TTL_SECS_ENV: &str = "IFTARLY_CACHE_TTL_SECS";
pub const CACHE_MAX_ENTRIES_ENV: &str = "IFTARLY_CACHE_MAX_ENTRIES";
pub const DEFAULT_METHOD_ENV: &str = "IFTARLY_DEFAULT_METHOD";
pub const PROXY_URL_ENV: &str = "IFTARLY_PROXY_URL";
pub const DATA_DIR_ENV: &str = "IFTARLY_DATA_DIR";
const XDG_DATA_HOME_ENV: &str = "XDG_DATA_HOME";
const HOME_ENV: &str = "HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub bind: String,
    pub upstream_url: String,
    pub cache_ttl_secs: u64,
    pub cache_max_entries: Option<usize>,
    pub default_method: u32,
    pub proxy_url: String,
    pub data_dir: PathBuf,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_pairs(std::env::vars())
    }

    pub(crate) fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            bind: text(&map, BIND_ENV).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            upstream_url: text(&map, UPSTREAM_URL_ENV)
                .unwrap_or_else(|| ALADHAN_API_BASE.to_string()),
            cache_ttl_secs: parsed(&map, CACHE_TTL_SECS_ENV)
                .filter(|ttl| *ttl > 0)
                .unwrap_or(CACHE_TTL_SECS),
            cache_max_entries: parsed(&map, CACHE_MAX_ENTRIES_ENV).filter(|max| *max > 0),
            default_method: parsed(&map, DEFAULT_METHOD_ENV).unwrap_or(DEFAULT_METHOD),
            proxy_url: text(&map, PROXY_URL_ENV).unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
            data_dir: resolve_data_dir(&map),
        }
    }

    pub fn cache(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl_secs),
            max_entries: self.cache_max_entries,
        }
    }
}

fn text(map: &HashMap<String, String>, key: &str) -> Option<String> {
    map.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parsed<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str) -> Option<T> {
    text(map, key).and_then(|value| value.parse().ok())
}

fn resolve_data_dir(map: &HashMap<String, String>) -> PathBuf {
    if let Some(dir) = text(map, DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    if let Some(xdg) = text(map, XDG_DATA_HOME_ENV) {
        return PathBuf::from(xdg).join("iftarly");
    }
    if let Some(home) = text(map, HOME_ENV) {
        return PathBuf::from(home).join(".local/share/iftarly");
    }
    std::env::temp_dir().join("iftarly")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = RuntimeConfig::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.upstream_url, "https://api.aladhan.com/v1");
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_max_entries, None);
        assert_eq!(config.default_method, 2);
        assert_eq!(config.proxy_url, "http://127.0.0.1:3000");
        assert_eq!(config.data_dir, std::env::temp_dir().join("iftarly"));
    }

    #[test]
    fn env_overrides_are_trimmed_and_parsed() {
        let config = RuntimeConfig::from_pairs([
            (BIND_ENV, " 127.0.0.1:8080 "),
            (CACHE_TTL_SECS_ENV, "120"),
            (CACHE_MAX_ENTRIES_ENV, "500"),
            (DEFAULT_METHOD_ENV, "16"),
            (HOME_ENV, "/home/amina"),
        ]);
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.cache().ttl, Duration::from_secs(120));
        assert_eq!(config.cache().max_entries, Some(500));
        assert_eq!(config.default_method, 16);
        assert_eq!(config.data_dir, PathBuf::from("/home/amina/.local/share/iftarly"));
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = RuntimeConfig::from_pairs([
            (CACHE_TTL_SECS_ENV, "soon"),
            (CACHE_MAX_ENTRIES_ENV, "0"),
            (DEFAULT_METHOD_ENV, "-1"),
            (DATA_DIR_ENV, "/var/lib/iftarly"),
            (XDG_DATA_HOME_ENV, "/ignored"),
        ]);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.cache_max_entries, None);
        assert_eq!(config.default_method, 2);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/iftarly"));
    }
}
