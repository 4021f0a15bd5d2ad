//! Connection settings for a daemon endpoint.

use std::{env, fmt, time::Duration};

/// The endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost/RPC2";

/// Connection settings for one daemon endpoint.
///
/// Settings are fixed once a client is built from them; talk to several daemons by
/// building several clients.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// The XML-RPC endpoint URL.
    pub endpoint: String,
    /// Basic auth user name. Auth is sent when either this or `password` is non-empty.
    pub username: String,
    /// Basic auth password.
    pub password: String,
    /// Skip TLS certificate validation. Insecure, meant for testing and diagnostics only.
    pub insecure_skip_verify: bool,
    /// Deadline for each HTTP request. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ClientConfig {
    /// Settings for `endpoint` without authentication.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: String::new(),
            password: String::new(),
            insecure_skip_verify: false,
            timeout: None,
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// `RTORRENT_ENDPOINT`, `RTORRENT_USERNAME`, `RTORRENT_PASSWORD`, `RTORRENT_INSECURE`
    /// (`1` or `true`) and `RTORRENT_TIMEOUT_SECS`. Unset or unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        Self {
            endpoint: env::var("RTORRENT_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.into()),
            username: env::var("RTORRENT_USERNAME").unwrap_or_default(),
            password: env::var("RTORRENT_PASSWORD").unwrap_or_default(),
            insecure_skip_verify: env::var("RTORRENT_INSECURE")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
            timeout: env::var("RTORRENT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        }
    }

    /// Use basic auth with these credentials.
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Enable or disable TLS certificate validation bypass.
    pub fn with_insecure_skip_verify(mut self, insecure: bool) -> Self {
        self.insecure_skip_verify = insecure;
        self
    }

    /// Abort requests that take longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The basic auth credentials, if any were configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.username.is_empty() && self.password.is_empty() {
            None
        } else {
            Some((&self.username, &self.password))
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"***")
            .field("insecure_skip_verify", &self.insecure_skip_verify)
            .field("timeout", &self.timeout)
            .finish()
    }
}
