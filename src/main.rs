//! Sensor Collector - bounded-run room sensor poller
//!
//! This program polls the organization's room sensor endpoint a fixed number
//! of times, flattens every reading into one row, and writes a CSV export.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables (a `.env` file in the
//! working directory is read first, if present):
//!
//! - `API_KEY`: Bearer token (required)
//! - `ORG_ID`: Organization identifier (required)
//! - `SENSOR_API_URL`: API base URL (default: https://api.pulse.neat.no)
//! - `SENSOR_POLL_COUNT`: Number of polls (default: 10)
//! - `SENSOR_POLL_INTERVAL_SECS`: Seconds between polls (default: 30)
//! - `SENSOR_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: none)
//! - `SENSOR_EXPORT_PATH`: CSV output path (default: sensor_data_export.csv)
//! - `RUST_LOG`: Logging level filter (default: info)

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sensor_collector::client::SensorClient;
use sensor_collector::collector::PollSchedule;
use sensor_collector::config::Config;
use sensor_collector::pipeline::run;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; the variables may come from the environment
    let dotenv = dotenvy::dotenv();

    init_tracing();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded .env file");
    }

    let config = match Config::from_env() {
        Ok(config) => {
            info!(
                sensor_url = %config.sensor_url,
                poll_count = config.poll_count,
                poll_interval_secs = config.poll_interval.as_secs(),
                export_path = %config.export_path.display(),
                "Configuration loaded"
            );
            config
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let client = match SensorClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create HTTP client");
            std::process::exit(1);
        }
    };

    match run(&client, PollSchedule::from_config(&config), &config.export_path).await {
        Ok(report) => {
            let stats = report.stats();
            info!(
                polls = stats.polls,
                failed = stats.failed,
                "Run finished"
            );
        }
        Err(e) => {
            error!(error = %e, path = %config.export_path.display(), "Export failed");
            std::process::exit(1);
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
