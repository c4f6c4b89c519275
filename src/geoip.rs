use std::net::IpAddr;

use serde_json::Value;

use crate::constants::{IPAPI_BASE, IPWHOIS_BASE};
use crate::error::GeoIpError;
use crate::fetch::JsonFetch;
use crate::models::{Coordinates, IpLocation, IpSource};

/// Lookup order; the first provider with a usable answer wins.
pub const PROVIDER_ORDER: [IpSource; 2] = [IpSource::Ipapi, IpSource::Ipwhois];

pub fn provider_url(source: IpSource, ip: Option<&str>) -> String {
    match (source, ip) {
        (IpSource::Ipapi, Some(ip)) => format!("{IPAPI_BASE}/{ip}/json/"),
        (IpSource::Ipapi, None) => format!("{IPAPI_BASE}/json/"),
        (IpSource::Ipwhois, Some(ip)) => format!("{IPWHOIS_BASE}/{ip}"),
        (IpSource::Ipwhois, None) => format!("{IPWHOIS_BASE}/"),
    }
}

/// First address of an `X-Forwarded-For` header value.
///
/// Anything that is not a literal IP address is ignored, so only an address
/// ever reaches a provider URL.
pub fn client_ip(forwarded_for: Option<&str>) -> Option<&str> {
    forwarded_for?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| ip.parse::<IpAddr>().is_ok())
}

/// Resolves approximate coordinates for a network address.
pub struct GeoIpLocator<F> {
    fetcher: F,
}

impl<F: JsonFetch> GeoIpLocator<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn locate(&self, ip: Option<&str>) -> Result<IpLocation, GeoIpError> {
        for source in PROVIDER_ORDER {
            let url = provider_url(source, ip);
            match self.fetcher.get_json(&url).await {
                Ok(body) => match coordinates(&body) {
                    Some(coords) => {
                        tracing::info!(provider = source.as_str(), "resolved location from IP");
                        return Ok(IpLocation {
                            latitude: coords.latitude,
                            longitude: coords.longitude,
                            source,
                        });
                    }
                    None => {
                        tracing::warn!(
                            provider = source.as_str(),
                            "provider returned unusable coordinates"
                        );
                    }
                },
                Err(error) => {
                    tracing::warn!(
                        provider = source.as_str(),
                        %error,
                        "IP geolocation provider failed"
                    );
                }
            }
        }

        Err(GeoIpError::Exhausted)
    }
}

fn coordinates(body: &Value) -> Option<Coordinates> {
    Coordinates::new(as_number(body.get("latitude"))?, as_number(body.get("longitude"))?)
}

/// Accepts JSON numbers and numeric strings
fn as_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}
