use std::collections::HashMap;

use bytes::Bytes;

/// The raw transport unit delivered by the broker, prior to decoding.
///
/// An envelope pairs the transport headers (a string-to-string map) with the
/// serialized body exactly as the broker delivered it. Decoding into a
/// [`DecodedMessage`](crate::DecodedMessage) never mutates the envelope;
/// decoders only borrow it.
///
/// The body is stored as [`Bytes`] so the in-memory transport can fan one
/// published envelope out to every subscriber without copying the payload.
///
/// # Example
///
/// ```ignore
/// let envelope = RawEnvelope::new(r#"{"orderId":42}"#)
///     .with_header("message-type", "OrderCreated");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnvelope {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl RawEnvelope {
    /// Create an envelope with the given body and no headers.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Attach a transport header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Look up a single header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// All transport headers.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// The serialized body as delivered by the transport.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_finds_attached_headers() {
        let envelope = RawEnvelope::new(r#"{"x":1}"#)
            .with_header("message-type", "Thing")
            .with_header("content-type", "application/json");

        assert_eq!(envelope.header("message-type"), Some("Thing"));
        assert_eq!(envelope.header("content-type"), Some("application/json"));
        assert_eq!(envelope.header("missing"), None);
        assert_eq!(envelope.headers().len(), 2);
    }

    #[test]
    fn body_is_preserved_verbatim() {
        let envelope = RawEnvelope::new(&b"not json at all"[..]);
        assert_eq!(envelope.body(), b"not json at all");
    }
}
