//! Command infrastructure for CQRS handlers.
//!
//! `CommandMetadata` carries who issued a command plus tracing context, and
//! stamps that context onto every event the handler emits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EventEnvelope, UserId};

/// Metadata context for command handlers.
///
/// A correlation ID is generated at construction so that all events emitted
/// by one command (e.g. a resolution and its cascade) share it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command.
    pub user_id: UserId,

    /// Links related operations across a single user request.
    correlation_id: String,

    /// Distributed tracing span/trace ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,

    /// Source of this command (e.g., "api", "websocket", "scheduler").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata with a fresh correlation ID.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: Uuid::new_v4().to_string(),
            trace_id: None,
            source: None,
        }
    }

    /// Builder: Override the correlation ID (e.g. one received at the API boundary).
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Builder: Add trace ID for distributed tracing.
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID.
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Returns the trace ID if set.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Propagates correlation, user and trace context onto an outgoing event.
    pub fn stamp(&self, envelope: EventEnvelope) -> EventEnvelope {
        let envelope = envelope
            .with_correlation_id(self.correlation_id.clone())
            .with_user_id(self.user_id.to_string());
        match &self.trace_id {
            Some(trace_id) => envelope.with_trace_id(trace_id.clone()),
            None => envelope,
        }
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Creates a test fixture with a test user ID.
    pub fn test_fixture() -> Self {
        Self::new(UserId::new("test-user-123").unwrap())
            .with_correlation_id("test-correlation-id")
            .with_source("test")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_generates_correlation_id() {
        let metadata = CommandMetadata::new(UserId::new("user-123").unwrap());

        assert!(!metadata.correlation_id().is_empty());
        assert!(metadata.trace_id().is_none());
        assert!(metadata.source().is_none());
    }

    #[test]
    fn correlation_id_is_stable_across_calls() {
        let metadata = CommandMetadata::new(UserId::new("user").unwrap());
        assert_eq!(metadata.correlation_id(), metadata.correlation_id());
    }

    #[test]
    fn builder_chain_sets_all_fields() {
        let metadata = CommandMetadata::new(UserId::new("user-456").unwrap())
            .with_correlation_id("corr-123")
            .with_trace_id("trace-456")
            .with_source("scheduler");

        assert_eq!(metadata.correlation_id(), "corr-123");
        assert_eq!(metadata.trace_id(), Some("trace-456"));
        assert_eq!(metadata.source(), Some("scheduler"));
    }

    #[test]
    fn stamp_propagates_context_to_envelope() {
        let metadata = CommandMetadata::test_fixture().with_trace_id("trace-1");
        let envelope = metadata.stamp(EventEnvelope::new("amend.result.v1", "a-1", "Amend", json!({})));

        assert_eq!(
            envelope.metadata.correlation_id.as_deref(),
            Some("test-correlation-id")
        );
        assert_eq!(envelope.metadata.user_id.as_deref(), Some("test-user-123"));
        assert_eq!(envelope.metadata.trace_id.as_deref(), Some("trace-1"));
    }

    #[test]
    fn serialization_skips_none_fields() {
        let metadata = CommandMetadata::new(UserId::new("user-skip").unwrap());

        let json = serde_json::to_string(&metadata).unwrap();

        assert!(json.contains("user_id"));
        assert!(json.contains("correlation_id"));
        assert!(!json.contains("trace_id"));
    }
}
