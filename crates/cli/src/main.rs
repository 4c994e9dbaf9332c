//! Tempcast CLI
//!
//! A command-line client for the Tempcast server: list cities, show
//! current weather and request next-temperature predictions.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{health, predict, weather};

/// Tempcast CLI
#[derive(Parser)]
#[command(name = "tempcast")]
#[command(author, version, about = "CLI for the Tempcast weather and prediction server", long_about = None)]
pub struct Cli {
    /// Server URL (can also be set via TEMPCAST_API_URL env var)
    #[arg(long, env = "TEMPCAST_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List supported cities
    Cities,

    /// Show current weather for a city
    Weather {
        /// City id as listed by `tempcast cities` (e.g. hyd)
        city_id: String,
    },

    /// Predict the next temperature from ten observations, oldest first
    Predict {
        /// Exactly ten temperatures
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        values: Vec<String>,
    },

    /// Show server health and readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let api_url = config::resolve_api_url(cli.api_url.as_deref())?;
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Cities => weather::list_cities(&client, cli.format).await?,
        Commands::Weather { city_id } => weather::show_weather(&client, &city_id, cli.format).await?,
        Commands::Predict { values } => predict::predict(&client, &values, cli.format).await?,
        Commands::Health => health::show_health(&client, cli.format).await?,
    }

    Ok(())
}
