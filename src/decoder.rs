//! Pluggable message envelope decoding.
//!
//! Brokers deliver opaque, format-specific envelopes; assertions want a
//! canonical [`DecodedMessage`]. The [`EnvelopeDecoder`] trait is the seam
//! between the two. A decoder is a stateless strategy object shared by every
//! subscription of a session, injected at
//! [`BrokerSession::connect`](crate::BrokerSession::connect); swapping wire
//! formats never touches subscription logic.
//!
//! Two formats ship with the crate:
//!
//! - [`HeaderJsonDecoder`]  - type name in the `message-type` transport
//!   header, body is a bare JSON document
//! - [`WrappedJsonDecoder`]  - self-describing body
//!   `{"messageType": "...", "message": {...}}`, headers ignored
//!
//! Supporting another envelope shape means adding one new implementer of
//! [`EnvelopeDecoder`]; nothing else changes.

use serde::Deserialize;
use serde_json::Value;

use crate::{DecodedMessage, Error, RawEnvelope, Result};

/// Transport header carrying the logical message type, by middleware
/// convention.
pub const TYPE_HEADER: &str = "message-type";

/// Sentinel type name for wire formats that carry no type metadata.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Decodes a raw transport envelope into a canonical message.
///
/// Implementations must be pure: no side effects, no mutation of the
/// envelope, and safe to call concurrently from every subscription's
/// receive loop (hence `Send + Sync`).
///
/// A decode failure is reported per message and the message is dropped; it
/// never aborts the owning subscription's receive loop.
pub trait EnvelopeDecoder: Send + Sync {
    /// Decode one envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] when the body cannot be parsed per this
    /// decoder's expected serialization.
    fn decode(&self, envelope: &RawEnvelope) -> Result<DecodedMessage>;
}

/// Decoder for the header-keyed middleware convention: the logical type
/// name travels in the [`TYPE_HEADER`] transport header and the body is a
/// bare JSON document.
///
/// A missing type header is not an error; the message decodes with the
/// [`UNKNOWN_TYPE`] sentinel so assertions can still inspect the body.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderJsonDecoder;

impl EnvelopeDecoder for HeaderJsonDecoder {
    fn decode(&self, envelope: &RawEnvelope) -> Result<DecodedMessage> {
        let body: Value = serde_json::from_slice(envelope.body()).map_err(Error::decode)?;
        let type_name = envelope.header(TYPE_HEADER).unwrap_or(UNKNOWN_TYPE);
        Ok(DecodedMessage::new(type_name, body))
    }
}

#[derive(Deserialize)]
struct WrappedBody {
    #[serde(rename = "messageType")]
    message_type: String,
    message: Value,
}

/// Decoder for self-describing envelopes: the body itself is a JSON wrapper
/// `{"messageType": "...", "message": {...}}` and transport headers are
/// ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct WrappedJsonDecoder;

impl EnvelopeDecoder for WrappedJsonDecoder {
    fn decode(&self, envelope: &RawEnvelope) -> Result<DecodedMessage> {
        let wrapper: WrappedBody =
            serde_json::from_slice(envelope.body()).map_err(Error::decode)?;
        Ok(DecodedMessage::new(wrapper.message_type, wrapper.message))
    }
}
