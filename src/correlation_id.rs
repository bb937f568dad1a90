use std::fmt;

use uuid::Uuid;

/// Identifier tying one test run to the messages it provokes.
///
/// Generated once when a [`BrokerSession`](crate::BrokerSession) is
/// constructed. Embed it in triggering requests (see
/// [`HttpGateway::with_correlation`](crate::HttpGateway::with_correlation))
/// so downstream services can tag the messages they emit as belonging to
/// this run. The tagging is a convention between the test and the system
/// under test; the harness does not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        CorrelationId::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_id_is_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn displays_as_hyphenated_uuid() {
        let id = CorrelationId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
    }
}
