//! # Change Events
//!
//! Fire-and-forget notification of resource mutations. The pipeline emits a
//! [`ChangeEvent`] after every successful `create`, `update` and `remove`,
//! plus `info`/`error` events for the outcome of best-effort follow-ups.
//!
//! [`EventBus`] fans events out over a Tokio broadcast channel: emitting never
//! waits for listeners, zero listeners is fine, and a listener that falls
//! behind loses the oldest events rather than slowing the action down.

use crate::entity::Actor;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Removed,
    Info,
    Error,
}

/// A serialized record for mutations, a message code for notices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Record(Value),
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub resource: &'static str,
    pub kind: ChangeKind,
    pub payload: EventPayload,
    pub actor: Option<Actor>,
}

impl ChangeEvent {
    pub fn new(
        resource: &'static str,
        kind: ChangeKind,
        payload: EventPayload,
        actor: Option<Actor>,
    ) -> Self {
        Self {
            resource,
            kind,
            payload,
            actor,
        }
    }

    /// Message code of an `info`/`error` event.
    pub fn message(&self) -> Option<&str> {
        match &self.payload {
            EventPayload::Message(code) => Some(code),
            EventPayload::Record(_) => None,
        }
    }
}

pub trait NotificationEmitter: Send + Sync {
    /// Publishes `event`. Must not block and must not fail the caller.
    fn emit(&self, event: ChangeEvent);
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    /// `capacity` bounds how far a listener may lag before losing events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl NotificationEmitter for EventBus {
    fn emit(&self, event: ChangeEvent) {
        let resource = event.resource;
        let kind = event.kind;
        match self.sender.send(event) {
            Ok(listeners) => trace!(resource, ?kind, listeners, "event emitted"),
            Err(_) => trace!(resource, ?kind, "event dropped, no listeners"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn delivers_to_every_listener() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(ChangeEvent::new(
            "users",
            ChangeKind::Created,
            EventPayload::Record(json!({ "code": "u1" })),
            Some(Actor::new("admin")),
        ));

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.kind, ChangeKind::Created);
        assert_eq!(a.actor, Some(Actor::new("admin")));
    }

    #[test]
    fn emitting_without_listeners_is_silent() {
        let bus = EventBus::new(1);
        bus.emit(ChangeEvent::new(
            "users",
            ChangeKind::Info,
            EventPayload::Message("emailSentPasswordResetLink".into()),
            None,
        ));
    }

    #[test]
    fn serializes_kind_in_lowercase() {
        let event = ChangeEvent::new(
            "users",
            ChangeKind::Error,
            EventPayload::Message("UnableToSendEmail".into()),
            None,
        );
        assert_eq!(event.message(), Some("UnableToSendEmail"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["payload"], "UnableToSendEmail");
    }
}
