//! Configuration module for the sensor collector.
//!
//! This module provides environment-based configuration: the API credentials,
//! the sensor API base URL, the poll schedule, and the export destination.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default base URL of the sensor API
const DEFAULT_API_URL: &str = "https://api.pulse.neat.no";

/// Default number of poll cycles per run
const DEFAULT_POLL_COUNT: u32 = 10;

/// Default delay between poll cycles in seconds
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default export file name
const DEFAULT_EXPORT_PATH: &str = "sensor_data_export.csv";

/// Upper bound on poll cycles so a typo cannot keep the run alive for days
const MAX_POLL_COUNT: u32 = 1_000;

/// Upper bound on the inter-poll delay
const MAX_POLL_INTERVAL_SECS: u64 = 3_600;

/// Configuration for a collection run.
///
/// Settings are read from environment variables:
/// - `API_KEY`: Bearer token for the sensor API (required)
/// - `ORG_ID`: Organization whose rooms are polled (required)
/// - `SENSOR_API_URL`: API base URL (default: https://api.pulse.neat.no)
/// - `SENSOR_POLL_COUNT`: Number of poll cycles (default: 10)
/// - `SENSOR_POLL_INTERVAL_SECS`: Seconds between polls (default: 30)
/// - `SENSOR_REQUEST_TIMEOUT_SECS`: HTTP request timeout (default: none)
/// - `SENSOR_EXPORT_PATH`: CSV output path (default: sensor_data_export.csv)
#[derive(Clone)]
pub struct Config {
    /// Bearer token sent with every request
    pub api_key: String,

    /// Organization identifier used in the endpoint path
    pub org_id: String,

    /// Base URL for the sensor API, without a trailing slash
    pub api_url: String,

    /// Full URL of the organization's room sensor endpoint
    pub sensor_url: String,

    /// Number of sequential poll cycles
    pub poll_count: u32,

    /// Delay between two consecutive poll cycles
    pub poll_interval: Duration,

    /// HTTP request timeout; `None` leaves the transport default (no timeout)
    pub request_timeout: Option<Duration>,

    /// Destination of the CSV export
    pub export_path: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("org_id", &self.org_id)
            .field("api_url", &self.api_url)
            .field("sensor_url", &self.sensor_url)
            .field("poll_count", &self.poll_count)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("export_path", &self.export_path)
            .finish()
    }
}

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl ConfigError {
    fn for_var(env_var: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            env_var: Some(env_var.to_string()),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Build the room sensor endpoint for an organization.
pub fn sensor_endpoint(api_url: &str, org_id: &str) -> String {
    format!("{}/v1/orgs/{}/rooms/sensor", api_url, org_id)
}

impl Config {
    /// Create a configuration with the given credentials and default settings.
    pub fn new(api_key: impl Into<String>, org_id: impl Into<String>) -> Self {
        let org_id = org_id.into();
        Self {
            api_key: api_key.into(),
            sensor_url: sensor_endpoint(DEFAULT_API_URL, &org_id),
            org_id,
            api_url: DEFAULT_API_URL.to_string(),
            poll_count: DEFAULT_POLL_COUNT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            request_timeout: None,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `API_KEY` or `ORG_ID` is missing or blank
    /// - a numeric setting is not a valid number or is out of range
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sensor_collector::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Polling: {}", config.sensor_url);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = Self::required(&lookup, "API_KEY")?;
        let org_id = Self::required(&lookup, "ORG_ID")?;

        let api_url = lookup("SENSOR_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = api_url.trim_end_matches('/').to_string();

        let sensor_url = sensor_endpoint(&api_url, &org_id);

        let poll_count = Self::parse_poll_count(&lookup)?;

        let poll_interval = Duration::from_secs(Self::parse_poll_interval(&lookup)?);

        let request_timeout = Self::parse_request_timeout(&lookup)?.map(Duration::from_secs);

        let export_path = lookup("SENSOR_EXPORT_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));

        Ok(Self {
            api_key,
            org_id,
            api_url,
            sensor_url,
            poll_count,
            poll_interval,
            request_timeout,
            export_path,
        })
    }

    fn required<F>(lookup: &F, env_var: &str) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(env_var) {
            Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Some(_) => Err(ConfigError::for_var(env_var, "must not be empty")),
            None => Err(ConfigError::for_var(
                env_var,
                "must be set in the environment or .env file",
            )),
        }
    }

    /// Parse the poll count with validation.
    fn parse_poll_count<F>(lookup: &F) -> Result<u32, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = "SENSOR_POLL_COUNT";

        match lookup(env_var) {
            Some(value) => {
                let count: u32 = value.trim().parse().map_err(|_| {
                    ConfigError::for_var(env_var, format!("'{}' is not a valid number", value))
                })?;

                if count == 0 {
                    return Err(ConfigError::for_var(
                        env_var,
                        "poll count must be greater than 0",
                    ));
                }

                if count > MAX_POLL_COUNT {
                    return Err(ConfigError::for_var(
                        env_var,
                        format!(
                            "poll count {} exceeds maximum allowed ({})",
                            count, MAX_POLL_COUNT
                        ),
                    ));
                }

                Ok(count)
            }
            None => Ok(DEFAULT_POLL_COUNT),
        }
    }

    /// Parse the inter-poll delay with validation.
    fn parse_poll_interval<F>(lookup: &F) -> Result<u64, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = "SENSOR_POLL_INTERVAL_SECS";

        match lookup(env_var) {
            Some(value) => {
                let interval: u64 = value.trim().parse().map_err(|_| {
                    ConfigError::for_var(env_var, format!("'{}' is not a valid number", value))
                })?;

                if interval > MAX_POLL_INTERVAL_SECS {
                    return Err(ConfigError::for_var(
                        env_var,
                        format!(
                            "poll interval {} exceeds maximum ({}s)",
                            interval, MAX_POLL_INTERVAL_SECS
                        ),
                    ));
                }

                Ok(interval)
            }
            None => Ok(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    fn parse_request_timeout<F>(lookup: &F) -> Result<Option<u64>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = "SENSOR_REQUEST_TIMEOUT_SECS";

        match lookup(env_var) {
            Some(value) => {
                let timeout: u64 = value.trim().parse().map_err(|_| {
                    ConfigError::for_var(env_var, format!("'{}' is not a valid number", value))
                })?;

                if timeout == 0 {
                    return Err(ConfigError::for_var(
                        env_var,
                        "request timeout must be greater than 0",
                    ));
                }

                Ok(Some(timeout))
            }
            None => Ok(None),
        }
    }
}
