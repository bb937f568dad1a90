use std::sync::Arc;

use crate::TopicName;

/// The single error type for all kiku operations.
///
/// Every fallible kiku API returns `kiku::Result<T>` (alias for
/// `Result<T, kiku::Error>`). Errors from lower layers (JSON parsing, HTTP,
/// task joins) are mapped into variants of this enum so callers only need to
/// handle one error type. Sources are wrapped in `Arc` to keep the error
/// cheap to clone.
///
/// A timed-out wait is NOT an error: it is the
/// [`ReceiveResult::TimedOut`](crate::ReceiveResult::TimedOut) outcome, which
/// the caller turns into a failed assertion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The connection configuration was rejected before any transport work.
    #[error("invalid connection config: {0}")]
    Config(String),

    /// The broker transport could not be reached or authenticated.
    #[error("broker transport unavailable: {0}")]
    Connection(String),

    /// One message body could not be parsed by the configured decoder.
    ///
    /// Reported per message by the receive loop; the message is dropped and
    /// the subscription keeps running.
    #[error("failed to decode message envelope: {0}")]
    Decode(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// An operation was attempted on a subscription after `close()`.
    #[error("subscription to '{0}' is closed")]
    SubscriptionClosed(TopicName),

    /// One or more subscriptions failed to release cleanly during
    /// [`BrokerSession::cleanup`](crate::BrokerSession::cleanup).
    ///
    /// Collected across all subscriptions so every one of them gets a
    /// cleanup attempt before the aggregate is returned.
    #[error("failed to release {} subscription(s)", failures.len())]
    Cleanup {
        failures: Vec<(TopicName, Arc<tokio::task::JoinError>)>,
    },

    /// An HTTP request issued through the gateway failed.
    #[error("HTTP request failed: {0}")]
    Http(#[source] Arc<reqwest::Error>),
}

impl Error {
    /// Wrap a decoder-specific parse failure.
    pub fn decode(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Decode(Arc::new(e))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(Arc::new(e))
    }
}
