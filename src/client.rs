//! HTTP client module for fetching room sensor data.
//!
//! This module provides the authenticated GET against the organization's
//! room sensor endpoint. A failed call degrades to `PollOutcome::Failure`
//! instead of aborting the run.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::model::PollOutcome;

/// Errors that can occur during a single sensor API call.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed
    Request(reqwest::Error),

    /// Server returned an error status code
    Status {
        code: StatusCode,
        message: String,
    },

    /// Response body was not valid JSON
    Parse(String),

    /// Request timeout
    Timeout,

    /// Client configuration error
    Config(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Request(e) => write!(f, "HTTP request failed: {}", e),
            ClientError::Status { code, message } => {
                write!(f, "Server error ({}): {}", code, message)
            }
            ClientError::Parse(e) => write!(f, "Failed to parse response: {}", e),
            ClientError::Timeout => write!(f, "Request timed out"),
            ClientError::Config(e) => write!(f, "Client configuration error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Request(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Request(err)
        }
    }
}

/// Anything that can produce one poll's worth of sensor data.
///
/// The collector only depends on this trait, so a run can be driven by the
/// real HTTP client or by a scripted source.
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Perform one poll. Never fails: errors come back as `PollOutcome::Failure`.
    async fn poll(&self) -> PollOutcome;
}

/// HTTP client for the room sensor endpoint.
///
/// # Example
///
/// ```no_run
/// use sensor_collector::client::SensorClient;
/// use sensor_collector::config::Config;
///
/// #[tokio::main]
/// async fn main() {
///     let config = Config::new("api-key", "org-id");
///     let client = SensorClient::new(&config).expect("Failed to create client");
///
///     match client.fetch().await {
///         Ok(body) => println!("{}", body),
///         Err(e) => eprintln!("Failed to fetch: {}", e),
///     }
/// }
/// ```
pub struct SensorClient {
    /// The underlying HTTP client
    client: Client,

    /// Full URL of the room sensor endpoint
    sensor_url: String,

    /// Bearer token
    api_key: String,

    /// Request timeout; `None` means the call waits for the server
    timeout: Option<Duration>,
}

impl SensorClient {
    /// Create a new sensor client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if the HTTP client cannot be built.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        Self::with_settings(
            config.sensor_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )
    }

    /// Create a new sensor client with custom settings.
    pub fn with_settings(
        sensor_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            client,
            sensor_url: sensor_url.into(),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Fetch the current room sensor data.
    ///
    /// A 2xx response whose body is not JSON is reported as `ClientError::Parse`.
    pub async fn fetch(&self) -> Result<Value, ClientError> {
        debug!(url = %self.sensor_url, "Requesting room sensor data");

        let response = self
            .client
            .get(&self.sensor_url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            Err(ClientError::Status {
                code: status,
                message,
            })
        }
    }

    /// Get the configured sensor endpoint URL.
    pub fn sensor_url(&self) -> &str {
        &self.sensor_url
    }

    /// Get the request timeout, if one was configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl SensorSource for SensorClient {
    async fn poll(&self) -> PollOutcome {
        match self.fetch().await {
            Ok(body) => PollOutcome::Success(body),
            Err(e) => {
                warn!(error = %e, "API call failed");
                PollOutcome::Failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        serve_once_after(Duration::ZERO, status_line, body).await
    }

    /// Serve exactly one HTTP response on a local port, `delay` after the
    /// request head arrives.
    ///
    /// Returns the base URL and a handle resolving to the raw request head.
    async fn serve_once_after(
        delay: Duration,
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            tokio::time::sleep(delay).await;

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            // The client may have hung up already after a timeout
            socket.write_all(response.as_bytes()).await.ok();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    fn client_with_timeout(base_url: &str, timeout: Option<Duration>) -> SensorClient {
        SensorClient::with_settings(
            format!("{}/v1/orgs/org-42/rooms/sensor", base_url),
            "secret-token",
            timeout,
        )
        .unwrap()
    }

    fn client_for(base_url: &str) -> SensorClient {
        client_with_timeout(base_url, None)
    }

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Timeout;
        assert_eq!(format!("{}", err), "Request timed out");

        let err = ClientError::Status {
            code: StatusCode::UNAUTHORIZED,
            message: "Invalid token".to_string(),
        };
        assert!(format!("{}", err).contains("401"));
        assert!(format!("{}", err).contains("Invalid token"));

        let err = ClientError::Parse("expected value".to_string());
        assert!(format!("{}", err).contains("expected value"));
    }

    #[test]
    fn test_client_creation() {
        let config = Config::new("key", "org-1");
        let client = SensorClient::new(&config).unwrap();
        assert_eq!(
            client.sensor_url(),
            "https://api.pulse.neat.no/v1/orgs/org-1/rooms/sensor"
        );
        assert_eq!(client.timeout(), None);
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let (base_url, server) = serve_once("200 OK", r#"{"data": []}"#).await;
        let client = client_for(&base_url);

        let body = client.fetch().await.unwrap();
        assert_eq!(body, serde_json::json!({"data": []}));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v1/orgs/org-42/rooms/sensor HTTP/1.1"));
        assert!(request
            .to_ascii_lowercase()
            .contains("authorization: bearer secret-token"));
    }

    #[tokio::test]
    async fn test_error_status_becomes_failure() {
        let (base_url, server) =
            serve_once("500 Internal Server Error", r#"{"error": "boom"}"#).await;
        let client = client_for(&base_url);

        let outcome = client.poll().await;
        server.await.unwrap();

        match outcome {
            PollOutcome::Failure(reason) => assert!(reason.contains("500")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_becomes_failure() {
        let (base_url, server) = serve_once("200 OK", "<html>maintenance</html>").await;
        let client = client_for(&base_url);

        let err = client.fetch().await.unwrap_err();
        server.await.unwrap();
        assert!(matches!(err, ClientError::Parse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_becomes_failure() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}", addr));
        assert!(!client.poll().await.is_success());
    }

    #[tokio::test]
    async fn test_success_poll_carries_body() {
        let body = r#"{"data": [{"id": "r1", "roomData": null}]}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = client_for(&base_url);

        let outcome = client.poll().await;
        server.await.unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Success(serde_json::json!({"data": [{"id": "r1", "roomData": null}]}))
        );
    }

    #[tokio::test]
    async fn test_default_client_waits_for_slow_response() {
        let (base_url, server) =
            serve_once_after(Duration::from_secs(2), "200 OK", r#"{"data": []}"#).await;
        let mut config = Config::new("secret-token", "org-42");
        config.sensor_url = format!("{}/v1/orgs/org-42/rooms/sensor", base_url);
        let client = SensorClient::new(&config).unwrap();

        let outcome = client.poll().await;
        server.await.unwrap();

        assert_eq!(client.timeout(), None);
        assert_eq!(outcome, PollOutcome::Success(serde_json::json!({"data": []})));
    }

    #[tokio::test]
    async fn test_configured_timeout_turns_slow_response_into_failure() {
        let (base_url, server) =
            serve_once_after(Duration::from_secs(2), "200 OK", r#"{"data": []}"#).await;
        let client = client_with_timeout(&base_url, Some(Duration::from_millis(500)));

        let err = client.fetch().await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ClientError::Timeout));
    }
}
