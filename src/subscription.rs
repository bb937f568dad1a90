use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    select,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    DecodedMessage, EnvelopeDecoder, Error, ReceiveResult, Result, TopicName,
    transport::EnvelopeStream,
};

/// An open listen on exactly one topic for the lifetime of one session.
///
/// From the moment the subscription is opened, a dedicated receive task
/// decodes every envelope the transport delivers and appends it to the
/// subscription's buffer - with or without an active waiter. This is the
/// reason subscriptions must be opened *before* the triggering action: a
/// message published a microsecond after `subscribe_to_topic` returns is
/// already being buffered, and the first
/// [`wait_for_message`](Self::wait_for_message) call will find it.
///
/// Successive waits consume the buffer in transport delivery order, one
/// message per call, never returning the same message twice. Across
/// *different* subscriptions no ordering is guaranteed.
///
/// # Example
///
/// ```ignore
/// // Subscribe BEFORE triggering the system under test.
/// let mut orders = session.subscribe_to_topic("orders.created").await?;
/// gateway.post_to_service(&url, &json!({"sku": "A-17"})).await?;
///
/// let result = orders.wait_for_message(Duration::from_secs(2)).await?;
/// assert!(result.did_receive(), "no OrderCreated within 2s");
/// ```
pub struct Subscription {
    topic: TopicName,
    receiver: UnboundedReceiver<DecodedMessage>,
    cursor: u64,
    closed: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("cursor", &self.cursor)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Open the subscription and start its receive task.
    ///
    /// Invoked by [`BrokerSession::subscribe_to_topic`](crate::BrokerSession::subscribe_to_topic),
    /// which keeps the returned handle for cascade cleanup.
    pub(crate) fn open<S: EnvelopeStream>(
        topic: TopicName,
        stream: S,
        decoder: Arc<dyn EnvelopeDecoder>,
    ) -> (Self, SubscriptionHandle) {
        let (sender, receiver) = unbounded_channel();
        let cancel = CancellationToken::new();
        let closed = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(receive_loop(
            topic.clone(),
            stream,
            decoder,
            sender,
            cancel.clone(),
        ));

        let subscription = Self {
            topic: topic.clone(),
            receiver,
            cursor: 0,
            closed: closed.clone(),
            cancel: cancel.clone(),
        };
        let handle = SubscriptionHandle {
            topic,
            cancel,
            closed,
            task,
        };
        (subscription, handle)
    }

    /// The topic this subscription listens on.
    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    /// Number of messages consumed so far.
    ///
    /// Advances by exactly one per successful wait, never on a timeout.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Returns true once the subscription has been closed, either directly
    /// or by session cleanup.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Wait for the next unread message, up to `timeout`.
    ///
    /// Returns immediately when a message is already buffered. Otherwise
    /// suspends until the next message arrives or the timeout elapses,
    /// whichever comes first; the receive task keeps buffering either way.
    /// A timeout resolves only this wait - it is reported as
    /// [`ReceiveResult::TimedOut`], not as an error, and leaves the cursor
    /// unchanged.
    ///
    /// Waits do not filter by message type or content; assert on the
    /// returned message's fields instead. Callers that want to skip
    /// non-matching messages can loop over `wait_for_message` under their
    /// own deadline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubscriptionClosed`] after [`close`](Self::close),
    /// after session cleanup, or once the transport stream has ended and
    /// the buffer is drained.
    pub async fn wait_for_message(&mut self, timeout: Duration) -> Result<ReceiveResult> {
        if self.is_closed() {
            return Err(Error::SubscriptionClosed(self.topic.clone()));
        }

        match tokio::time::timeout(timeout, self.receiver.recv()).await {
            Ok(Some(message)) => {
                self.cursor += 1;
                Ok(ReceiveResult::Received(message))
            }
            Ok(None) => {
                // Receive task gone and buffer drained: nothing can arrive anymore.
                self.closed.store(true, Ordering::Release);
                Err(Error::SubscriptionClosed(self.topic.clone()))
            }
            Err(_) => Ok(ReceiveResult::TimedOut),
        }
    }

    /// Stop the receive task and release the transport listen.
    ///
    /// Subsequent waits fail with [`Error::SubscriptionClosed`]. Closing an
    /// already-closed subscription is a no-op.
    pub fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();
    }
}

/// Session-side handle to one subscription's receive task.
///
/// Lets [`BrokerSession::cleanup`](crate::BrokerSession::cleanup) cascade
/// a close to subscriptions it no longer holds directly.
pub(crate) struct SubscriptionHandle {
    topic: TopicName,
    cancel: CancellationToken,
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub(crate) fn topic(&self) -> &TopicName {
        &self.topic
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();
    }

    pub(crate) async fn join(self) -> std::result::Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// One cooperative receive loop per open subscription.
///
/// Single writer to the buffer: decodes each delivered envelope and appends
/// it in arrival order. A decode failure drops that one message and keeps
/// the loop running; it never affects other subscriptions.
async fn receive_loop<S: EnvelopeStream>(
    topic: TopicName,
    mut stream: S,
    decoder: Arc<dyn EnvelopeDecoder>,
    buffer: UnboundedSender<DecodedMessage>,
    cancel: CancellationToken,
) {
    loop {
        select! {
            biased;
            _ = cancel.cancelled() => break,
            delivery = stream.recv() => match delivery {
                Some(envelope) => match decoder.decode(&envelope) {
                    Ok(message) => {
                        tracing::debug!(topic = %topic, message_type = %message.type_name(), "buffered message");
                        if buffer.send(message).is_err() {
                            break;
                        }
                    }
                    Err(error) => {
                        tracing::warn!(topic = %topic, %error, "dropping undecodable message");
                    }
                },
                None => {
                    tracing::debug!(topic = %topic, "transport stream ended");
                    break;
                }
            },
        }
    }
}
