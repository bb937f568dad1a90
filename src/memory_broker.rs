use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    ConnectionConfig, RawEnvelope, Result, TopicName,
    transport::{BrokerTransport, EnvelopeStream},
};

type TopicTable = HashMap<TopicName, Vec<UnboundedSender<RawEnvelope>>>;

/// In-process broker transport.
///
/// Fans every published envelope out to all open subscriptions on the
/// topic. Used by this crate's own tests and by tests that drive the system
/// under test directly instead of through a real broker.
///
/// `MemoryBroker` is cheap to clone; all clones share the same topic table,
/// so a test can keep one handle for publishing while the session owns
/// another:
///
/// ```ignore
/// let broker = MemoryBroker::new();
/// let mut session = BrokerSession::connect(config, broker.clone(), decoder).await?;
/// let mut orders = session.subscribe_to_topic("orders.created").await?;
/// broker.publish("orders.created", envelope);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryBroker {
    topics: Arc<Mutex<TopicTable>>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an envelope to every open subscription on `topic`.
    ///
    /// Returns the number of subscriptions it was delivered to. Publishing
    /// to a topic nobody listens on is not an error; the envelope is simply
    /// dropped, as a real broker would for an unbound queue.
    pub fn publish(&self, topic: impl Into<TopicName>, envelope: RawEnvelope) -> usize {
        let topic = topic.into();
        let mut topics = self.lock_topics();
        let Some(senders) = topics.get_mut(&topic) else {
            return 0;
        };
        senders.retain(|sender| !sender.is_closed());
        senders
            .iter()
            .filter(|sender| sender.send(envelope.clone()).is_ok())
            .count()
    }

    fn lock_topics(&self) -> std::sync::MutexGuard<'_, TopicTable> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BrokerTransport for MemoryBroker {
    type Stream = MemoryStream;

    async fn check_connection(&self, _config: &ConnectionConfig) -> Result<()> {
        Ok(())
    }

    async fn subscribe(&self, topic: &TopicName) -> Result<MemoryStream> {
        let (sender, receiver) = unbounded_channel();
        self.lock_topics()
            .entry(topic.clone())
            .or_default()
            .push(sender);
        Ok(MemoryStream { receiver })
    }
}

/// Stream side of one in-memory topic listen.
#[derive(Debug)]
pub struct MemoryStream {
    receiver: UnboundedReceiver<RawEnvelope>,
}

impl EnvelopeStream for MemoryStream {
    async fn recv(&mut self) -> Option<RawEnvelope> {
        self.receiver.recv().await
    }
}
