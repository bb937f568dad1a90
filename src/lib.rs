//! # Kiku
//!
//! A subscription-and-wait test harness for event-driven backends on Tokio.
//!
//! Kiku is for testing systems that answer an HTTP call by publishing
//! messages to a broker. Attach subscriptions to the topics you care about
//! *before* issuing the triggering action, then assert on the messages one
//! at a time with bounded waits. Buffering starts the instant a
//! subscription opens, so a message emitted microseconds after the trigger
//! is never missed - the central guarantee of the harness.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//! use kiku::{BrokerSession, ConnectionConfig, HeaderJsonDecoder, HttpGateway, MemoryBroker};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> kiku::Result {
//!     let broker = MemoryBroker::new();
//!     let mut session = BrokerSession::connect(
//!         ConnectionConfig::new("memory://local"),
//!         broker.clone(),
//!         Arc::new(HeaderJsonDecoder),
//!     )
//!     .await?;
//!
//!     // Subscribe BEFORE the triggering action.
//!     let mut orders = session.subscribe_to_topic("orders.created").await?;
//!
//!     let gateway = HttpGateway::new()?.with_correlation(session.correlation_id());
//!     gateway
//!         .post_to_service("http://localhost:8080/orders", &json!({"sku": "A-17"}))
//!         .await?;
//!
//!     let result = orders.wait_for_message(Duration::from_secs(2)).await?;
//!     let message = result.into_message().expect("no OrderCreated within 2s");
//!     assert_eq!(message.type_name(), "OrderCreated");
//!
//!     session.cleanup().await
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BrokerSession`] | One test run's connection context; owns subscriptions, carries the correlation ID |
//! | [`Subscription`] | Buffered listen on one topic with the bounded [`wait_for_message`](Subscription::wait_for_message) operation |
//! | [`ReceiveResult`] | "Message arrived" vs. "timed out" outcome of one wait |
//! | [`EnvelopeDecoder`] | Pluggable wire-format strategy turning a [`RawEnvelope`] into a [`DecodedMessage`] |
//! | [`BrokerTransport`] | Boundary to the broker SDK: subscribe(topic) yields a stream of envelopes |
//! | [`MemoryBroker`] | In-process transport for tests without a real broker |
//! | [`HttpGateway`] | Thin request/response wrapper for the triggering action |
//! | [`CorrelationId`] | Per-run identifier for tagging downstream messages |
//!
//! ## Wire Formats
//!
//! Decoders are stateless strategy objects injected at session construction
//! and shared by every subscription. [`HeaderJsonDecoder`] understands the
//! `message-type`-header convention; [`WrappedJsonDecoder`] understands
//! self-describing bodies. Other envelope shapes are one trait
//! implementation away - see [`decoder`].
//!
//! ## What Kiku Does Not Do
//!
//! No exactly-once or cross-topic ordering guarantees, no retries of the
//! triggering action, no deduplication, no persisted state. It consumes a
//! broker; it is not one.

mod config;
mod correlation_id;
pub mod decoder;
mod envelope;
mod error;
mod gateway;
mod memory_broker;
mod message;
mod receive_result;
mod session;
mod subscription;
mod topic_name;
pub mod transport;

pub use config::ConnectionConfig;
pub use correlation_id::CorrelationId;
pub use decoder::{EnvelopeDecoder, HeaderJsonDecoder, WrappedJsonDecoder};
pub use envelope::RawEnvelope;
pub use error::Error;
pub use gateway::{CORRELATION_HEADER, HttpGateway, ServiceResponse};
pub use memory_broker::{MemoryBroker, MemoryStream};
pub use message::DecodedMessage;
pub use receive_result::ReceiveResult;
pub use session::BrokerSession;
pub use subscription::Subscription;
pub use topic_name::TopicName;
pub use transport::{BrokerTransport, EnvelopeStream};

/// Convenience alias for `Result<T, kiku::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
