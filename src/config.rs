use std::time::Duration;

use crate::{Error, Result};

/// Connection settings for a [`BrokerSession`](crate::BrokerSession).
///
/// The harness imposes no config file format; construct this from wherever
/// your test environment keeps its settings and pass it to
/// [`BrokerSession::connect`](crate::BrokerSession::connect), which
/// validates it eagerly.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use kiku::ConnectionConfig;
///
/// let config = ConnectionConfig::new("amqp://broker.test:5672")
///     .with_connect_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    endpoint: String,
    connect_timeout: Duration,
}

impl ConnectionConfig {
    /// Default transport probe timeout: 5 seconds.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set how long the transport probe may take before the session
    /// construction fails.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// The broker endpoint (connection string or URL).
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The transport probe timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Reject missing or empty values before any transport work.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the endpoint is empty or whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::Config("endpoint must not be empty".into()));
        }
        Ok(())
    }
}
