use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters, ServerHandler},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use std::sync::Arc;

use crate::fetch::HttpJson;
use crate::formatters::{
    format_ip_location, format_methods, format_schedule, parse_api_date, to_api_date,
};
use crate::geoip::GeoIpLocator;
use crate::models::{Coordinates, GetPrayerTimesRequest, LocateByIpRequest};
use crate::prayer::{PrayerQuery, PrayerService};

/// MCP tool server exposing the prayer pipeline to assistants
#[derive(Clone)]
pub struct PrayerTools {
    prayer: Arc<PrayerService<HttpJson>>,
    geoip: Arc<GeoIpLocator<HttpJson>>,
    default_method: u32,
    tool_router: ToolRouter<Self>,
}

impl PrayerTools {
    pub fn new(
        prayer: Arc<PrayerService<HttpJson>>,
        geoip: Arc<GeoIpLocator<HttpJson>>,
        default_method: u32,
    ) -> Self {
        Self {
            prayer,
            geoip,
            default_method,
            tool_router: Self::tool_router(),
        }
    }

    fn query(&self, request: GetPrayerTimesRequest) -> Result<PrayerQuery, McpError> {
        let coordinates = Coordinates::new(request.latitude, request.longitude).ok_or_else(|| {
            McpError::invalid_params(
                "Coordinates out of valid range: latitude must be within [-90, 90] and longitude within [-180, 180].",
                None,
            )
        })?;

        let date = match request.date.as_deref() {
            Some(raw) => parse_api_date(raw).map(to_api_date).ok_or_else(|| {
                McpError::invalid_params("Invalid date, expected dd-mm-yyyy.", None)
            })?,
            None => to_api_date(chrono::Local::now().date_naive()),
        };

        Ok(PrayerQuery {
            coordinates,
            date,
            method: request.method.unwrap_or(self.default_method),
        })
    }
}

#[tool_handler]
impl ServerHandler for PrayerTools {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "iftarly".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Daily Islamic prayer times powered by the Aladhan API. \
                Provides the nine daily timings, Hijri and Gregorian dates, and approximate \
                location lookup by IP address."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl PrayerTools {
    /// Gets the prayer schedule for a location and date
    #[tool(description = "Get daily prayer times for a location. Provide latitude and longitude (e.g., latitude: 23.8103, longitude: 90.4125 for Dhaka). Optionally provide a date in dd-mm-yyyy format and a calculation method id (see list_methods; 16 selects the Bangladesh convention).")]
    async fn get_prayer_times(
        &self,
        Parameters(request): Parameters<GetPrayerTimesRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(
            "Getting prayer times for coordinates: {}, {}",
            request.latitude,
            request.longitude
        );

        let query = self.query(request)?;
        let schedule = self.prayer.prayer_times(&query).await.map_err(|e| {
            McpError::internal_error(format!("Failed to fetch prayer times: {}", e), None)
        })?;

        Ok(CallToolResult::success(vec![Content::text(format_schedule(
            &schedule,
        ))]))
    }

    /// Resolves approximate coordinates for an IP address
    #[tool(description = "Look up approximate coordinates for a public IP address. Omit the ip to locate the server itself.")]
    async fn locate_by_ip(
        &self,
        Parameters(request): Parameters<LocateByIpRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Locating by IP: {:?}", request.ip);

        let ip = request.ip.as_deref().map(str::trim).filter(|ip| !ip.is_empty());
        let location = self
            .geoip
            .locate(ip)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(CallToolResult::success(vec![Content::text(
            format_ip_location(&location),
        )]))
    }

    /// Lists the supported calculation methods
    #[tool(description = "List the supported prayer time calculation methods and their ids.")]
    async fn list_methods(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(format_methods())]))
    }
}
