use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use rmcp::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use iftarly::api::{create_router, AppState};
use iftarly::client::{
    FileLocationStore, LoadState, LocationResolver, PrayerTimesController, ProxyClient,
    ProxyGeolocator, Selection,
};
use iftarly::config::RuntimeConfig;
use iftarly::fetch::HttpJson;
use iftarly::formatters::{format_countdown, format_methods, format_schedule, parse_api_date};
use iftarly::geoip::GeoIpLocator;
use iftarly::prayer::PrayerService;
use iftarly::schedule::next_prayer;
use iftarly::service::PrayerTools;

#[derive(Parser)]
#[command(name = "iftarly", version, about = "Daily Islamic prayer times")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP proxy (`/api/prayer`, `/api/location`)
    Serve {
        /// Listen address, e.g. 127.0.0.1:3000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run the MCP tool server over stdio
    Mcp,
    /// Print today's (or a given day's) schedule via a running proxy
    Times {
        /// Calculation method id
        #[arg(long)]
        method: Option<u32>,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
        /// Proxy base URL
        #[arg(long)]
        proxy: Option<String>,
        /// Print the raw schedule as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the supported calculation methods
    Methods,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iftarly=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = RuntimeConfig::from_env();

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            serve(config).await
        }
        Command::Mcp => mcp(config).await,
        Command::Times {
            method,
            date,
            proxy,
            json,
        } => times(config, method, date, proxy, json).await,
        Command::Methods => {
            println!("{}", format_methods());
            Ok(())
        }
    }
}

type Upstream = (Arc<PrayerService<HttpJson>>, Arc<GeoIpLocator<HttpJson>>);

fn upstream(config: &RuntimeConfig) -> Result<Upstream> {
    let fetcher = HttpJson::new().context("failed to build HTTP client")?;
    let prayer = PrayerService::new(
        fetcher.clone(),
        config.upstream_url.clone(),
        config.cache(),
    );
    let geoip = GeoIpLocator::new(fetcher);
    Ok((Arc::new(prayer), Arc::new(geoip)))
}

async fn serve(config: RuntimeConfig) -> Result<()> {
    let (prayer, geoip) = upstream(&config)?;
    let app = create_router(AppState {
        prayer,
        geoip,
        default_method: config.default_method,
    });

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("Prayer times proxy listening on {}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn mcp(config: RuntimeConfig) -> Result<()> {
    tracing::info!("Starting MCP prayer times server");

    let (prayer, geoip) = upstream(&config)?;
    let server = PrayerTools::new(prayer, geoip, config.default_method)
        .serve(rmcp::transport::stdio())
        .await?;
    server.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn times(
    config: RuntimeConfig,
    method: Option<u32>,
    date: Option<chrono::NaiveDate>,
    proxy: Option<String>,
    json: bool,
) -> Result<()> {
    let proxy_url = proxy.unwrap_or(config.proxy_url);
    let api = ProxyClient::new(proxy_url.as_str())?;
    let geolocator = ProxyGeolocator::new(HttpJson::new()?, &proxy_url);
    let store = FileLocationStore::new(&config.data_dir);

    let mut selection = Selection::today(method.unwrap_or(config.default_method));
    if let Some(date) = date {
        selection.date = date;
    }

    let controller =
        PrayerTimesController::new(api, LocationResolver::new(geolocator, store), selection);
    controller.load().await?;

    match controller.state() {
        LoadState::Success(data) => {
            if json {
                println!("{}", serde_json::to_string_pretty(data.as_ref())?);
                return Ok(());
            }
            println!("{}", format_schedule(&data));
            if controller.is_today() {
                let shown_for = parse_api_date(&data.date.gregorian.date);
                let now = Local::now().naive_local();
                if shown_for == Some(now.date()) {
                    if let Some(next) = next_prayer(&data.timings, now) {
                        println!("\n{}", format_countdown(&next));
                    }
                }
            }
            Ok(())
        }
        LoadState::Error(error) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&error)?);
            }
            Err(error.into())
        }
        LoadState::Idle | LoadState::Loading => anyhow::bail!("prayer times load did not finish"),
    }
}
