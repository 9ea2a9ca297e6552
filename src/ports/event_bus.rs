//! Event bus ports.
//!
//! Handlers publish text and amendment events after their writes succeed;
//! read models such as the activity feed subscribe to the types they project.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Outbound side of the bus.
///
/// Delivery is at-least-once, so subscribers see duplicates and must
/// deduplicate on `event_id`.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publishes in order and stops at the first failure. Events already
    /// delivered stay delivered.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

/// A subscriber reacting to published events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Shown in bus errors and logs.
    fn name(&self) -> &'static str;
}

/// Registration side of the bus, keyed by event type such as `"amend.result.v1"`.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Accepts a fixed number of events, then fails.
    struct Flaky {
        capacity: usize,
        accepted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventPublisher for Flaky {
        async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
            let mut accepted = self.accepted.lock().unwrap();
            if accepted.len() == self.capacity {
                return Err(DomainError::database("bus full"));
            }
            accepted.push(event.aggregate_id);
            Ok(())
        }
    }

    fn result(amend: &str) -> EventEnvelope {
        EventEnvelope::new("amend.result.v1", amend, "Amend", json!({}))
    }

    #[tokio::test]
    async fn publish_all_stops_at_first_failure() {
        let bus = Flaky {
            capacity: 2,
            accepted: Mutex::new(Vec::new()),
        };

        let err = bus
            .publish_all(vec![result("a-1"), result("a-2"), result("a-3"), result("a-4")])
            .await
            .unwrap_err();

        assert_eq!(err.message, "bus full");
        assert_eq!(*bus.accepted.lock().unwrap(), vec!["a-1", "a-2"]);
    }

    #[test]
    fn ports_are_object_safe() {
        fn _publisher(_: &dyn EventPublisher) {}
        fn _handler(_: &dyn EventHandler) {}
        fn _subscriber(_: &dyn EventSubscriber) {}
    }
}
