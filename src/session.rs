use std::sync::Arc;

use crate::{
    ConnectionConfig, CorrelationId, EnvelopeDecoder, Error, Result, Subscription, TopicName,
    subscription::SubscriptionHandle, transport::BrokerTransport,
};

/// One test run's connection context.
///
/// The session owns every [`Subscription`] it opens (for cascade cleanup),
/// holds the shared [`EnvelopeDecoder`], and carries the run's
/// [`CorrelationId`]. Create it once per test run, open all subscriptions
/// *before* the triggering action, and call [`cleanup`](Self::cleanup) at
/// teardown.
///
/// # Example
///
/// ```ignore
/// let broker = MemoryBroker::new();
/// let mut session = BrokerSession::connect(
///     ConnectionConfig::new("memory://local"),
///     broker.clone(),
///     Arc::new(HeaderJsonDecoder),
/// ).await?;
///
/// let mut orders = session.subscribe_to_topic("orders.created").await?;
/// // ... trigger the system under test, assert on orders ...
///
/// session.cleanup().await?;
/// ```
pub struct BrokerSession<B: BrokerTransport> {
    correlation_id: CorrelationId,
    transport: B,
    decoder: Arc<dyn EnvelopeDecoder>,
    handles: Vec<SubscriptionHandle>,
    cleaned_up: bool,
}

impl<B: BrokerTransport> std::fmt::Debug for BrokerSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerSession")
            .field("correlation_id", &self.correlation_id)
            .field("subscriptions", &self.handles.len())
            .field("cleaned_up", &self.cleaned_up)
            .finish_non_exhaustive()
    }
}

impl<B: BrokerTransport> BrokerSession<B> {
    /// Connect a new session.
    ///
    /// Validates the config and probes the transport eagerly so a
    /// misconfigured broker fails here, at test setup, with a clear error -
    /// no partial session is returned. The decoder is stateless and shared
    /// read-only by every subscription this session opens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid config and
    /// [`Error::Connection`] when the transport cannot be reached.
    pub async fn connect(
        config: ConnectionConfig,
        transport: B,
        decoder: Arc<dyn EnvelopeDecoder>,
    ) -> Result<Self> {
        config.validate()?;
        match tokio::time::timeout(config.connect_timeout(), transport.check_connection(&config))
            .await
        {
            Ok(probe) => probe?,
            Err(_) => {
                return Err(Error::Connection(format!(
                    "timed out reaching broker at {}",
                    config.endpoint()
                )));
            }
        }

        let correlation_id = CorrelationId::new();
        tracing::debug!(%correlation_id, endpoint = config.endpoint(), "broker session connected");

        Ok(Self {
            correlation_id,
            transport,
            decoder,
            handles: Vec::new(),
            cleaned_up: false,
        })
    }

    /// The identifier generated for this test run.
    ///
    /// Embed it in triggering requests (see
    /// [`HttpGateway::with_correlation`](crate::HttpGateway::with_correlation))
    /// so downstream services can tag the messages they emit.
    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    /// Open a subscription on `topic` and start buffering immediately.
    ///
    /// Call before the triggering action so no fast-arriving message is
    /// missed. Subscribing to the same topic twice yields two independent
    /// subscriptions with independent cursors - two vantage points on one
    /// topic, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when the listen cannot be established
    /// or the session has already been cleaned up.
    pub async fn subscribe_to_topic(&mut self, topic: impl Into<TopicName>) -> Result<Subscription> {
        if self.cleaned_up {
            return Err(Error::Connection("session already cleaned up".into()));
        }

        let topic = topic.into();
        let stream = self.transport.subscribe(&topic).await?;
        let (subscription, handle) = Subscription::open(topic, stream, Arc::clone(&self.decoder));
        self.handles.push(handle);
        Ok(subscription)
    }

    /// Close every owned subscription and release the session.
    ///
    /// Best-effort cascade: all subscriptions are cancelled first, then each
    /// receive task is awaited in turn, so one failure never prevents the
    /// others from being released. Failures are collected into a single
    /// aggregate [`Error::Cleanup`]. Idempotent - the second call is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cleanup`] listing the subscriptions whose receive
    /// tasks did not shut down cleanly.
    pub async fn cleanup(&mut self) -> Result<()> {
        if self.cleaned_up {
            return Ok(());
        }
        self.cleaned_up = true;

        for handle in &self.handles {
            handle.close();
        }

        let mut failures = Vec::new();
        for handle in self.handles.drain(..) {
            let topic = handle.topic().clone();
            if let Err(error) = handle.join().await {
                tracing::warn!(topic = %topic, %error, "receive task did not shut down cleanly");
                failures.push((topic, Arc::new(error)));
            }
        }

        tracing::debug!(correlation_id = %self.correlation_id, "broker session cleaned up");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Cleanup { failures })
        }
    }
}

impl<B: BrokerTransport> Drop for BrokerSession<B> {
    fn drop(&mut self) {
        // Tests that forget cleanup() still must not leak receive tasks.
        for handle in &self.handles {
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        HeaderJsonDecoder, MemoryBroker, RawEnvelope, decoder::TYPE_HEADER,
        transport::EnvelopeStream,
    };

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("memory://local")
    }

    fn decoder() -> Arc<dyn EnvelopeDecoder> {
        Arc::new(HeaderJsonDecoder)
    }

    fn order_envelope(order_id: u64) -> RawEnvelope {
        RawEnvelope::new(format!(r#"{{"orderId":{order_id}}}"#))
            .with_header(TYPE_HEADER, "OrderCreated")
    }

    /// Transport stub whose connection probe always fails.
    struct UnreachableBroker;

    struct NeverStream;

    impl EnvelopeStream for NeverStream {
        async fn recv(&mut self) -> Option<RawEnvelope> {
            None
        }
    }

    impl BrokerTransport for UnreachableBroker {
        type Stream = NeverStream;

        async fn check_connection(&self, config: &ConnectionConfig) -> crate::Result<()> {
            Err(Error::Connection(format!("no broker at {}", config.endpoint())))
        }

        async fn subscribe(&self, _topic: &TopicName) -> crate::Result<NeverStream> {
            Ok(NeverStream)
        }
    }

    #[tokio::test]
    async fn connect_rejects_empty_endpoint() {
        let result =
            BrokerSession::connect(ConnectionConfig::new(""), MemoryBroker::new(), decoder()).await;

        let err = result.err().expect("empty endpoint must not connect");
        assert!(matches!(err, Error::Config(_)), "got: {err:?}");
    }

    /// Transport stub whose connection probe never resolves.
    struct HangingBroker;

    impl BrokerTransport for HangingBroker {
        type Stream = NeverStream;

        async fn check_connection(&self, _config: &ConnectionConfig) -> crate::Result<()> {
            std::future::pending().await
        }

        async fn subscribe(&self, _topic: &TopicName) -> crate::Result<NeverStream> {
            Ok(NeverStream)
        }
    }

    #[tokio::test]
    async fn connect_honors_the_probe_timeout() {
        let config = ConnectionConfig::new("amqp://blackhole:5672")
            .with_connect_timeout(Duration::from_millis(100));

        let result = BrokerSession::connect(config, HangingBroker, decoder()).await;
        let err = result.err().expect("hanging probe must time out");
        assert!(matches!(err, Error::Connection(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn connect_fails_fast_when_transport_is_unreachable() {
        let result = BrokerSession::connect(config(), UnreachableBroker, decoder()).await;

        let err = result.err().expect("unreachable broker must not connect");
        assert!(matches!(err, Error::Connection(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn each_session_gets_its_own_correlation_id() {
        let broker = MemoryBroker::new();
        let a = BrokerSession::connect(config(), broker.clone(), decoder()).await.unwrap();
        let b = BrokerSession::connect(config(), broker, decoder()).await.unwrap();

        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[tokio::test]
    async fn same_topic_twice_gives_independent_vantage_points() {
        let broker = MemoryBroker::new();
        let mut session = BrokerSession::connect(config(), broker.clone(), decoder())
            .await
            .unwrap();

        let mut first = session.subscribe_to_topic("orders.created").await.unwrap();
        let mut second = session.subscribe_to_topic("orders.created").await.unwrap();

        broker.publish("orders.created", order_envelope(1));
        broker.publish("orders.created", order_envelope(2));

        for sub in [&mut first, &mut second] {
            let a = sub.wait_for_message(Duration::from_millis(500)).await.unwrap();
            let b = sub.wait_for_message(Duration::from_millis(500)).await.unwrap();
            assert_eq!(a.message().unwrap().field("orderId"), Some(&serde_json::json!(1)));
            assert_eq!(b.message().unwrap().field("orderId"), Some(&serde_json::json!(2)));
            assert_eq!(sub.cursor(), 2);
        }

        session.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_closes_every_subscription() {
        let broker = MemoryBroker::new();
        let mut session = BrokerSession::connect(config(), broker.clone(), decoder())
            .await
            .unwrap();

        let mut orders = session.subscribe_to_topic("orders.created").await.unwrap();
        let mut payments = session.subscribe_to_topic("payments.settled").await.unwrap();

        session.cleanup().await.unwrap();

        for sub in [&mut orders, &mut payments] {
            let err = sub.wait_for_message(Duration::from_millis(100)).await.unwrap_err();
            assert!(matches!(err, Error::SubscriptionClosed(_)), "got: {err:?}");
        }
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let broker = MemoryBroker::new();
        let mut session = BrokerSession::connect(config(), broker, decoder()).await.unwrap();
        session.subscribe_to_topic("orders.created").await.unwrap();

        session.cleanup().await.unwrap();
        session.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn subscribe_after_cleanup_is_rejected() {
        let broker = MemoryBroker::new();
        let mut session = BrokerSession::connect(config(), broker, decoder()).await.unwrap();
        session.cleanup().await.unwrap();

        let err = session.subscribe_to_topic("orders.created").await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
    }

    /// End to end: subscribe before publishing, trigger, assert - the
    /// shape every test against a real backend takes.
    #[tokio::test]
    async fn publish_then_wait_round_trip() {
        let broker = MemoryBroker::new();
        let mut session = BrokerSession::connect(config(), broker.clone(), decoder())
            .await
            .unwrap();
        let mut orders = session.subscribe_to_topic("orders.created").await.unwrap();

        broker.publish("orders.created", order_envelope(42));

        let result = orders.wait_for_message(Duration::from_millis(2000)).await.unwrap();
        assert!(result.did_receive());
        assert_eq!(
            result.message().unwrap().field("orderId"),
            Some(&serde_json::json!(42))
        );

        session.cleanup().await.unwrap();
    }
}
