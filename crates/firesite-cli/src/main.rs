mod geocode;
mod matching;
mod zone;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "firesite")]
#[command(about = "Forest name matching, geocoding, and fire-weather zone lookup")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Match fire-ban forest names against the facilities directory and closure notices
    Match {
        /// YAML file with `fire_ban`, `facilities`, and `closures` lists
        sources: PathBuf,
        /// Print the full resolution as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve coordinates for one or more forests
    Geocode {
        /// Forest names (e.g., "Badja State Forest")
        #[arg(required = true)]
        names: Vec<String>,
        /// Alternative spelling from the facilities directory (single name only)
        #[arg(long)]
        hint: Option<String>,
        /// Maximum lookups in flight (defaults to FIRESITE_MAX_CONCURRENT_LOOKUPS)
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print results as JSON, including the attempt trail
        #[arg(long)]
        json: bool,
    },
    /// Find the fire-weather zone containing a coordinate
    Zone {
        /// GeoJSON FeatureCollection of zone polygons
        #[arg(long)]
        feed: PathBuf,
        /// Feature property holding the zone id when the feature has none
        #[arg(long, default_value = "id")]
        id_property: String,
        /// Feature property holding the zone name
        #[arg(long, default_value = "name")]
        name_property: String,
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = firesite_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Match { sources, json } => matching::run_match(&sources, json),
        Commands::Geocode {
            names,
            hint,
            concurrency,
            json,
        } => geocode::run_geocode(&config, &names, hint.as_deref(), concurrency, json).await,
        Commands::Zone {
            feed,
            id_property,
            name_property,
            latitude,
            longitude,
        } => zone::run_zone(
            &feed,
            firesite_zones::FeedOptions {
                id_property,
                name_property,
            },
            latitude,
            longitude,
        ),
    }
}
