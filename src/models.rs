use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Location Models
// ============================================================================

/// A validated pair of geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds coordinates, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let coords = Self {
            latitude,
            longitude,
        };
        coords.is_valid().then_some(coords)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Which IP geolocation provider answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpSource {
    Ipapi,
    Ipwhois,
}

impl IpSource {
    pub fn as_str(self) -> &'static str {
        match self {
            IpSource::Ipapi => "ipapi",
            IpSource::Ipwhois => "ipwhois",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub source: IpSource,
}

// ============================================================================
// Prayer Schedule Models
// ============================================================================

/// The nine daily times, each formatted as `"H:MM AM|PM"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimesData {
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub sunset: String,
    pub maghrib: String,
    pub isha: String,
    pub imsak: String,
    pub midnight: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HijriDate {
    pub day: String,
    pub weekday: String,
    pub month: String,
    /// 1-12, or 0 when the upstream omitted it
    pub month_number: u32,
    pub year: String,
    pub designation: String,
    pub holidays: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GregorianMonth {
    pub number: u32,
    pub en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GregorianDate {
    pub date: String,
    pub day: String,
    pub month: GregorianMonth,
    pub year: String,
    pub weekday: LocalizedName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub hijri: HijriDate,
    pub gregorian: GregorianDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMeta {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub method: MethodMeta,
}

/// Stable schema returned by the prayer proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerApiResponse {
    pub timings: PrayerTimesData,
    pub date: CalendarDate,
    pub meta: ResponseMeta,
}

/// Body of every non-2xx proxy response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetPrayerTimesRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Date in dd-mm-yyyy; today when omitted
    pub date: Option<String>,
    /// Calculation method id; see `list_methods`
    pub method: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct LocateByIpRequest {
    /// Public IP address to look up; the server's own address when omitted
    pub ip: Option<String>,
}
