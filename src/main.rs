pub mod types;
pub mod config;
pub mod fetch;
pub mod hours;
pub mod processing;
pub mod render;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the ATM data once and write the map page to a file
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the map, rebuilding it from the API on every request
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            let app_config = config::AppConfig::load_or_default(config)?;

            let client = fetch::build_client(&app_config.api)?;
            let report = fetch::fetch_all(&client, &app_config.api).await;

            let markers = processing::build_markers(&app_config.processing, &report.regions);
            let filters = processing::filter_substrings(&app_config.processing);

            let page = render::render_page(&markers, &filters, &report.failures)?;
            std::fs::write(&app_config.output.html_path, page).with_context(|| {
                format!("Failed to write page to {:?}", app_config.output.html_path)
            })?;

            info!(
                path = ?app_config.output.html_path,
                markers = markers.len(),
                failed_regions = report.failures.len(),
                "generation complete"
            );
        }
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_or_default(config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
