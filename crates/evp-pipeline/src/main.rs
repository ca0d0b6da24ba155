//! EVP - Event file pipeline

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use evp_common::logging::{init_logging, LogConfig};
use evp_pipeline::{config::PipelineConfig, pipeline};
use tracing::{error, info, Level};

#[derive(Parser, Debug)]
#[command(name = "evp")]
#[command(
    author,
    version,
    about = "Batch pipeline: FTP event files -> age-partitioned JSON -> S3"
)]
struct Cli {
    /// Processing date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env()?;
    if cli.verbose {
        log_config.level = Level::DEBUG;
    }
    init_logging(&log_config)?;

    let config = PipelineConfig::from_env()?;

    // The processing date is pinned here and shared by every stage
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());

    info!("Starting pipeline run for {}", date);
    match pipeline::run(&config, date).await {
        Ok(_) => {
            info!("Process completed successfully!");
            Ok(())
        },
        Err(e) => {
            error!("Pipeline run failed: {:#}", e);
            Err(e)
        },
    }
}
