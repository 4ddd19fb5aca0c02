//! neo-impact: near-Earth-object lookups and impact estimates.
//!
//! Single-binary Tokio application that:
//! 1. Fetches NASA NeoWs feed, browse and lookup views through a TTL cache
//! 2. Estimates the consequences of a hypothetical impact
//! 3. Assesses consequences and deflection needs for JPL Sentry objects
//! 4. Compares an energy yield against well-known events
//!
//! Results are printed as pretty JSON on stdout. Logs go to stderr.

mod config;
mod facade;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error, info};

use common::{Error, ImpactParameters};
use facade::{feed_view_key, ErrorResponse, NeoService};

/// Near-Earth-object lookups and impact estimates
#[derive(Parser)]
#[command(name = "neo-impact", about = "NEO lookups and impact estimates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Asteroids with a close approach in a date window (default: around today).
    Feed {
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// One page of the NEO catalogue.
    Browse {
        #[arg(long, default_value_t = 0)]
        page: u32,
    },
    /// A single asteroid by SPK-ID.
    Lookup { id: String },
    /// Risk and deflection assessment for a Sentry-listed object.
    Risk { designation: String },
    /// Estimate the consequences of an impact.
    Impact {
        /// Impactor diameter (m).
        #[arg(long, allow_negative_numbers = true)]
        diameter: f64,
        /// Entry velocity (km/s).
        #[arg(long, allow_negative_numbers = true)]
        velocity: f64,
        /// Impactor density (kg/m³).
        #[arg(long, default_value_t = 3000.0, allow_negative_numbers = true)]
        density: f64,
        /// Entry angle (degrees).
        #[arg(long, default_value_t = 45.0, allow_negative_numbers = true)]
        angle: f64,
        #[arg(long)]
        ocean: bool,
        /// Distance from impact point to the nearest coast (km).
        #[arg(long, default_value_t = 50.0, allow_negative_numbers = true)]
        coast_distance: f64,
    },
    /// Compare a yield in megatons of TNT with well-known events.
    Compare {
        #[arg(allow_negative_numbers = true)]
        megatons: f64,
    },
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "neo_impact=info,neows_client=info,feed_cache=info,impact=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let result = match config::load_config() {
        Ok(cfg) => {
            debug!("Provider {} (attempts={})", cfg.provider.base_url, cfg.retry.max_attempts);
            let service = NeoService::from_config(&cfg);
            let result = run(&service, cli.command).await;
            let stats = service.cache_stats();
            debug!(
                "Cache: {} hits, {} misses, {} refreshes ({} failed, {} stale served)",
                stats.hits, stats.misses, stats.refreshes, stats.refresh_failures, stats.stale_served
            );
            result
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(body) => println!("{body}"),
        Err(e) => {
            error!("{}", e);
            let response = ErrorResponse::from(&e);
            match serde_json::to_string_pretty(&response) {
                Ok(body) => println!("{body}"),
                Err(_) => println!("{{\"code\":\"{}\"}}", response.code),
            }
            std::process::exit(1);
        }
    }
}

async fn run(service: &NeoService, command: Command) -> Result<String, Error> {
    match command {
        Command::Feed { start, end } => {
            let today = Utc::now().date_naive();
            let window = service.feed_window(start.as_deref(), end.as_deref(), today)?;
            let records = service
                .get_asteroid_feed(&feed_view_key(&window), window)
                .await?;
            info!(
                "{} asteroids between {} and {}",
                records.len(),
                window.start_date(),
                window.end_date()
            );
            to_json(&records)
        }
        Command::Browse { page } => to_json(&service.browse(page).await?),
        Command::Lookup { id } => to_json(&service.get_asteroid_by_id(&id).await?),
        Command::Risk { designation } => {
            let assessment = service
                .assess_risk(&designation, Utc::now().naive_utc())
                .await?;
            to_json(&assessment)
        }
        Command::Impact {
            diameter,
            velocity,
            density,
            angle,
            ocean,
            coast_distance,
        } => {
            let params = ImpactParameters {
                diameter_meters: diameter,
                velocity_km_per_sec: velocity,
                density_kg_per_m3: density,
                entry_angle_deg: angle.clamp(0.0, 90.0),
                is_ocean_impact: ocean,
                distance_to_coast_km: coast_distance,
            };
            to_json(&service.estimate_impact(&params)?)
        }
        Command::Compare { megatons } => to_json(&service.compare_energy(megatons)),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}
