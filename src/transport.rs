//! The boundary between the harness and the broker platform.
//!
//! Connection management, topic provisioning, delivery and acknowledgement
//! semantics all belong to the broker SDK behind these traits. The harness
//! only needs two things from it: "subscribe to a topic" and "the
//! subscription yields raw envelopes until closed". Delivery may be
//! at-least-once; the harness does not deduplicate.
//!
//! [`MemoryBroker`](crate::MemoryBroker) is the in-process reference
//! implementation used by this crate's own tests.

use std::future::Future;

use crate::{ConnectionConfig, RawEnvelope, Result, TopicName};

/// A broker transport capable of opening per-topic listens.
///
/// Methods return futures but can be implemented as `async fn` directly.
/// No `#[async_trait]` macro is required.
pub trait BrokerTransport: Send + Sync + 'static {
    /// The stream of raw envelopes produced by one open listen.
    type Stream: EnvelopeStream;

    /// Verify the transport is reachable and authenticated.
    ///
    /// Called once, eagerly, during
    /// [`BrokerSession::connect`](crate::BrokerSession::connect) so that a
    /// misconfigured broker fails the test at construction rather than as a
    /// confusing timeout later.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) when the
    /// broker cannot be reached.
    fn check_connection(
        &self,
        config: &ConnectionConfig,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Open a listen on `topic`, yielding envelopes from now on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) when the
    /// listen cannot be established.
    fn subscribe(
        &self,
        topic: &TopicName,
    ) -> impl Future<Output = Result<Self::Stream>> + Send;
}

/// One open topic listen, yielding raw envelopes in delivery order.
///
/// Dropping the stream releases the underlying transport listen.
pub trait EnvelopeStream: Send + 'static {
    /// Receive the next envelope, or `None` once the listen has ended.
    fn recv(&mut self) -> impl Future<Output = Option<RawEnvelope>> + Send;
}
