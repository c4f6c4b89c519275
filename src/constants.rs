/// User agent string for HTTP requests
pub const USER_AGENT: &str = "iftarly/0.1.0";

/// Aladhan timings API base URL
pub const ALADHAN_API_BASE: &str = "https://api.aladhan.com/v1";

/// ipapi.co lookup base URL
pub const IPAPI_BASE: &str = "https://ipapi.co";

/// ipwho.is lookup base URL
pub const IPWHOIS_BASE: &str = "https://ipwho.is";

/// Default listen address of the proxy server
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Default proxy base URL used by the terminal client
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

/// Calculation method used when a request does not name one (ISNA)
pub const DEFAULT_METHOD: u32 = 2;

/// Lifetime of a cached prayer schedule
pub const CACHE_TTL_SECS: u64 = 60 * 60;

/// Cache-Control header attached to successful prayer responses
pub const PRAYER_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=1800";

/// Storage key (file stem) of the persisted last-known location
pub const LOCATION_STORAGE_KEY: &str = "last-location";

/// Wait bound for a device geolocation fix
pub const GEOLOCATION_TIMEOUT_SECS: u64 = 10;

/// Oldest cached geolocation fix that may be reused
pub const GEOLOCATION_MAXIMUM_AGE_SECS: u64 = 5 * 60;
