use crate::DecodedMessage;

/// Outcome of a single [`Subscription::wait_for_message`](crate::Subscription::wait_for_message) call.
///
/// Distinguishes "a message arrived" from "the timeout elapsed first". A
/// timeout is a normal negative result, not an error; the caller turns it
/// into a failed assertion. "Arrived but didn't match what I expected" is
/// the caller's judgement to make on the returned message.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiveResult {
    /// The next unread message, in transport delivery order.
    Received(DecodedMessage),
    /// No message arrived within the wait's timeout.
    TimedOut,
}

impl ReceiveResult {
    /// Returns true if a message was received.
    pub fn did_receive(&self) -> bool {
        matches!(self, ReceiveResult::Received(_))
    }

    /// The received message, if any.
    pub fn message(&self) -> Option<&DecodedMessage> {
        match self {
            ReceiveResult::Received(message) => Some(message),
            ReceiveResult::TimedOut => None,
        }
    }

    /// Consume the result, returning the received message, if any.
    pub fn into_message(self) -> Option<DecodedMessage> {
        match self {
            ReceiveResult::Received(message) => Some(message),
            ReceiveResult::TimedOut => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn received_carries_the_message() {
        let message = DecodedMessage::new("OrderCreated", json!({"orderId": 42}));
        let result = ReceiveResult::Received(message.clone());

        assert!(result.did_receive());
        assert_eq!(result.message(), Some(&message));
        assert_eq!(result.into_message(), Some(message));
    }

    #[test]
    fn timed_out_carries_nothing() {
        let result = ReceiveResult::TimedOut;

        assert!(!result.did_receive());
        assert_eq!(result.message(), None);
        assert_eq!(result.into_message(), None);
    }
}
