use std::fmt;

use serde_json::Value;

/// The canonical, transport-agnostic representation of one broker message.
///
/// Produced by an [`EnvelopeDecoder`](crate::EnvelopeDecoder) from a
/// [`RawEnvelope`](crate::RawEnvelope) and returned to the test by
/// [`Subscription::wait_for_message`](crate::Subscription::wait_for_message).
/// Immutable once constructed: assertions inspect it, nothing rewrites it.
///
/// # Example
///
/// ```ignore
/// let result = orders.wait_for_message(Duration::from_secs(2)).await?;
/// let message = result.into_message().expect("no OrderCreated message");
/// assert_eq!(message.type_name(), "OrderCreated");
/// assert_eq!(message.field("orderId"), Some(&json!(42)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    type_name: String,
    body: Value,
}

impl DecodedMessage {
    /// Construct a decoded message. Called by decoder implementations.
    pub fn new(type_name: impl Into<String>, body: Value) -> Self {
        Self {
            type_name: type_name.into(),
            body,
        }
    }

    /// The logical message type, extracted from transport headers or envelope
    /// metadata. [`UNKNOWN_TYPE`](crate::decoder::UNKNOWN_TYPE) when the wire
    /// format carried none.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The decoded payload.
    #[inline]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Look up a top-level body field by name.
    ///
    /// Returns `None` when the body is not an object or lacks the field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.body.get(name)
    }

    /// Consume the message, returning the payload.
    pub fn into_body(self) -> Value {
        self.body
    }
}

impl fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_name, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_access_by_name() {
        let message = DecodedMessage::new("OrderCreated", json!({"orderId": 42, "total": 9.5}));

        assert_eq!(message.type_name(), "OrderCreated");
        assert_eq!(message.field("orderId"), Some(&json!(42)));
        assert_eq!(message.field("total"), Some(&json!(9.5)));
        assert_eq!(message.field("missing"), None);
    }

    #[test]
    fn field_on_non_object_body_is_none() {
        let message = DecodedMessage::new("Raw", json!([1, 2, 3]));
        assert_eq!(message.field("anything"), None);
    }

    #[test]
    fn into_body_returns_payload() {
        let message = DecodedMessage::new("OrderCreated", json!({"orderId": 42}));
        assert_eq!(message.into_body(), json!({"orderId": 42}));
    }
}
