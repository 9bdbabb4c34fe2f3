use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use places_explorer::config::Config;
use places_explorer::geo::extract_coordinates;
use places_explorer::ingest::telegram::TelegramClient;
use places_explorer::ingest::{IngestFlow, Messenger, NoopMessenger};
use places_explorer::logging::init_logging;
use places_explorer::maintenance::backfill_image_urls;
use places_explorer::migrate::import_geojson_dir;
use places_explorer::server::{start_server, AppState};
use places_explorer::storage::{CatalogStore, SqliteStore};
use places_explorer::taxonomy::Taxonomy;

#[derive(Parser)]
#[command(name = "places-explorer")]
#[command(about = "Venue catalog service with map-link coordinate ingestion")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (catalog API + ingestion webhook)
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Import per-category GeoJSON files into the catalog
    Migrate {
        /// Directory holding <category>.geojson files
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Backfill venue images from a local image directory
    BackfillImages {
        /// Directory holding <slug>.{svg,png,jpg} files
        #[arg(long, default_value = "public/images/venues")]
        images_dir: PathBuf,
    },
    /// Extract coordinates from a map link and print them
    ExtractCoords {
        /// The map-service URL to parse
        url: String,
    },
}

/// Config file, logging, and taxonomy tables for the commands that touch
/// the catalog. `extract-coords` is pure and never calls this.
fn load_environment(config_path: &str) -> Result<(Config, Arc<Taxonomy>), Box<dyn std::error::Error>> {
    let config = Config::load(config_path)?;
    init_logging(&config.logging);

    let taxonomy = Arc::new(match &config.taxonomy.path {
        Some(path) => Taxonomy::load(path)?,
        None => Taxonomy::builtin(),
    });
    Ok((config, taxonomy))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let (config, taxonomy) = load_environment(&cli.config)?;
            let store: Arc<dyn CatalogStore> =
                Arc::new(SqliteStore::open(&config.database.path, &taxonomy)?);

            let messenger: Arc<dyn Messenger> = match TelegramClient::from_env() {
                Some(client) => Arc::new(client),
                None => {
                    warn!("TELEGRAM_BOT_TOKEN not set; bot replies will only be logged");
                    Arc::new(NoopMessenger)
                }
            };

            let flow = Arc::new(IngestFlow::new(
                store.clone(),
                messenger,
                taxonomy.clone(),
            ));
            let state = Arc::new(AppState {
                store,
                flow,
                taxonomy,
            });

            let port = port.unwrap_or(config.server.port);
            start_server(state, port).await?;
        }
        Commands::Migrate { data_dir } => {
            let (config, taxonomy) = load_environment(&cli.config)?;
            let store = SqliteStore::open(&config.database.path, &taxonomy)?;
            let summary = import_geojson_dir(&store, &taxonomy, &data_dir).await?;
            info!(
                "migration finished: {} files, {} imported, {} duplicates, {} skipped",
                summary.files, summary.imported, summary.duplicates, summary.skipped
            );
            println!("\n📦 Migration results:");
            println!("   Files:      {}", summary.files);
            println!("   Imported:   {}", summary.imported);
            println!("   Duplicates: {}", summary.duplicates);
            println!("   Skipped:    {}", summary.skipped);
        }
        Commands::BackfillImages { images_dir } => {
            let (config, taxonomy) = load_environment(&cli.config)?;
            let store = SqliteStore::open(&config.database.path, &taxonomy)?;
            let summary = backfill_image_urls(&store, &images_dir).await?;
            info!(
                "backfill finished: {} scanned, {} updated",
                summary.scanned, summary.updated
            );
            println!("\n🖼  Updated {} of {} venues", summary.updated, summary.scanned);
        }
        // Pure link parsing: no config file, no logging, no store.
        Commands::ExtractCoords { url } => match extract_coordinates(&url) {
            Some((longitude, latitude)) => {
                println!("longitude: {longitude}");
                println!("latitude:  {latitude}");
            }
            None => {
                println!("No coordinates found in that URL.");
            }
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_coords_parses_without_a_config_flag() {
        let cli = Cli::try_parse_from([
            "places-explorer",
            "extract-coords",
            "https://maps.google.com/?q=44.81,20.45",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::ExtractCoords { .. }));
    }

    #[test]
    fn serve_accepts_a_port_override() {
        let cli =
            Cli::try_parse_from(["places-explorer", "serve", "--port", "9090"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9090) }));
    }
}
