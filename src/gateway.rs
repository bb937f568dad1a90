use std::time::Duration;

use serde_json::Value;

use crate::{CorrelationId, Result};

/// Request header carrying the test run's correlation identifier.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Thin request/response wrapper for driving the system under test.
///
/// The triggering action of an event-driven test is usually an HTTP call;
/// this gateway issues it and hands back status and body, nothing more. No
/// retries - if the trigger fails, the test should fail.
///
/// Stamp requests with the session's correlation identifier so downstream
/// services can tag the messages they emit:
///
/// ```ignore
/// let gateway = HttpGateway::new()?.with_correlation(session.correlation_id());
/// let response = gateway.post_to_service(&url, &json!({"sku": "A-17"})).await?;
/// assert!(response.is_success());
/// ```
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    correlation_id: Option<CorrelationId>,
}

impl HttpGateway {
    /// Default per-request timeout: 30 seconds.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Build a gateway with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) when the underlying
    /// client cannot be constructed.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Self::DEFAULT_REQUEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            correlation_id: None,
        })
    }

    /// Stamp every outgoing request with [`CORRELATION_HEADER`].
    #[must_use]
    pub fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// POST a JSON body to the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) when the request cannot
    /// be sent or the response cannot be read. A non-2xx status is not an
    /// error; inspect [`ServiceResponse::status`].
    pub async fn post_to_service(&self, url: &str, body: &Value) -> Result<ServiceResponse> {
        let request = self.client.post(url).json(body);
        self.send(request).await
    }

    /// GET from the service.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`](crate::Error::Http) when the request cannot
    /// be sent or the response cannot be read.
    pub async fn get_from_service(&self, url: &str) -> Result<ServiceResponse> {
        let request = self.client.get(url);
        self.send(request).await
    }

    async fn send(&self, mut request: reqwest::RequestBuilder) -> Result<ServiceResponse> {
        if let Some(correlation_id) = self.correlation_id {
            request = request.header(CORRELATION_HEADER, correlation_id.to_string());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        // Services under test usually answer JSON; anything else is kept as
        // a plain string value so assertions can still see it.
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        Ok(ServiceResponse { status, body })
    }
}

/// Status and decoded body of one service call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    status: u16,
    body: Value,
}

impl ServiceResponse {
    /// The HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The response body: parsed JSON when possible, otherwise the raw text
    /// as a string value, `Null` for an empty body.
    pub fn body(&self) -> &Value {
        &self.body
    }
}
