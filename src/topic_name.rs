use std::{hash::Hash, sync::Arc};

/// Name of a broker topic.
///
/// Used as the subscription key everywhere a topic is referenced: when
/// opening a [`Subscription`](crate::Subscription), when publishing through
/// the in-memory transport, and in error messages.
///
/// `TopicName` is cheap to clone. Equality uses string comparison with a
/// fast path for pointer equality when names share the same allocation.
///
/// Most APIs accept `impl Into<TopicName>`, so plain string literals work:
///
/// ```ignore
/// let orders = session.subscribe_to_topic("orders.created").await?;
/// ```
#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct TopicName(Arc<str>);

impl TopicName {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the string representation of this topic name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for TopicName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for TopicName {}

impl std::fmt::Display for TopicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for TopicName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for TopicName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TopicName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}
