//! Sensor Collector Library
//!
//! This library provides the pieces of a bounded sensor-data collection run:
//!
//! - **config**: Environment-based configuration (credentials, schedule, output)
//! - **client**: Authenticated HTTP client for the room sensor endpoint
//! - **collector**: Sequential poll orchestration with a fixed interval
//! - **model**: Per-level response records and the flat export row
//! - **flatten**: Nested responses to one row per sensor reading
//! - **export**: CSV writer for the flattened rows
//! - **pipeline**: One full run (poll, flatten, export) with its report
//!
//! # Example
//!
//! ```no_run
//! use sensor_collector::client::SensorClient;
//! use sensor_collector::collector::PollSchedule;
//! use sensor_collector::config::Config;
//! use sensor_collector::pipeline::{run, RunReport};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Load configuration from environment
//!     let config = Config::from_env().expect("Failed to load config");
//!
//!     // Create HTTP client
//!     let client = SensorClient::new(&config).expect("Failed to create client");
//!
//!     // Poll, flatten and export
//!     let schedule = PollSchedule::from_config(&config);
//!     match run(&client, schedule, &config.export_path).await {
//!         Ok(RunReport::Exported { path, records, .. }) => {
//!             println!("Wrote {} rows to {}", records, path.display())
//!         }
//!         Ok(RunReport::NoData { .. }) => println!("No data to export."),
//!         Err(e) => eprintln!("Export failed: {}", e),
//!     }
//! }
//! ```

// Module declarations
pub mod client;
pub mod collector;
pub mod config;
pub mod export;
pub mod flatten;
pub mod model;
pub mod pipeline;

// Re-export commonly used types at crate root for convenience
pub use client::{ClientError, SensorClient, SensorSource};
pub use collector::{collect, Collection, CollectionStats, PollSchedule};
pub use config::{Config, ConfigError};
pub use export::{export_csv, ExportError};
pub use flatten::flatten;
pub use model::{FlatRecord, PollOutcome, Room, RoomData, Scalar, SensorReading, SensorResponse};
pub use pipeline::{run, RunReport};
