//! Byte-in/byte-out transport to the daemon.
//!
//! This module provides the [`Transport`] trait which abstracts how encoded requests reach
//! the daemon, enabling mocking in tests, and [`HttpTransport`], the HTTP(S) implementation.

use std::error::Error as _;

use reqwest::{
    blocking::Client,
    header::{CONTENT_TYPE, HeaderValue},
};
use rtorrent_types::RTorrentError;
use tracing::{trace, warn};
use url::Url;

use crate::config::ClientConfig;

/// Sends one encoded request and returns the raw response body.
///
/// Implementations perform exactly one round trip per call, without retries or caching.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Send `body` and return the response body.
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, RTorrentError>;
}

/// XML-RPC over HTTP(S) POST.
///
/// Holds only immutable configuration and a connection pool, so a single instance can be
/// shared between threads. Built on a blocking client; do not use it from inside an async
/// runtime.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint.
    pub fn new(config: &ClientConfig) -> Result<Self, RTorrentError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            RTorrentError::InvalidEndpoint(format!("{}: {e}", config.endpoint))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(RTorrentError::InvalidEndpoint(format!(
                "{}: unsupported scheme {}",
                config.endpoint,
                endpoint.scheme()
            )));
        }

        if config.insecure_skip_verify {
            warn!("TLS certificate validation is disabled for {endpoint}");
        }
        let client = Client::builder()
            .danger_accept_invalid_certs(config.insecure_skip_verify)
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RTorrentError::InvalidEndpoint(format!(
                    "failed to build HTTP client: {}",
                    error_chain(&e)
                ))
            })?;

        Ok(Self {
            client,
            endpoint,
            credentials: config
                .credentials()
                .map(|(user, password)| (user.to_string(), password.to_string())),
        })
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, RTorrentError> {
        trace!("POST {} ({} bytes)", self.endpoint, body.len());
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("text/xml"))
            .body(body);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RTorrentError::Transport {
                status: Some(status.as_u16()),
                message: format!("{} responded with HTTP {status}", self.endpoint),
            });
        }

        let bytes = response.bytes().map_err(map_reqwest_error)?;
        trace!("received {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

/// Maps reqwest errors to transport errors, keeping the underlying causes.
fn map_reqwest_error(err: reqwest::Error) -> RTorrentError {
    RTorrentError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: error_chain(&err),
    }
}

fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
