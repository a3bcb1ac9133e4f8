//! Portal events and the broadcast channel that carries them.
//!
//! Handlers publish after the platform has accepted a change; the
//! [`ContextListener`](crate::ContextListener) is the main subscriber.
//! Delivery is best effort and never blocks the publishing request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A user signed in; the actor is the platform user id.
pub const SESSION_SIGNED_IN: &str = "session.signed_in";
/// A user signed out.
pub const SESSION_SIGNED_OUT: &str = "session.signed_out";
/// An intake submission reached the success state.
pub const APPLICATION_SUBMITTED: &str = "application.submitted";
/// A profile row changed (self-service edit or onboarding).
pub const PROFILE_UPDATED: &str = "profile.updated";

// ---------------------------------------------------------------------------
// PortalEvent
// ---------------------------------------------------------------------------

/// Something that happened in the portal, as seen by subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalEvent {
    /// One of the constants above.
    pub event_type: String,
    pub source_entity_type: Option<String>,
    /// Row id as assigned by the platform.
    pub source_entity_id: Option<String>,
    /// Platform user the event is about. Absent for anonymous applicants.
    pub actor_user_id: Option<Uuid>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl PortalEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id.into());
        self
    }

    pub fn with_actor(mut self, user_id: Uuid) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out of [`PortalEvent`]s to every live subscriber.
///
/// ```rust
/// use fellowship_events::bus::{EventBus, PortalEvent, SESSION_SIGNED_IN};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
/// bus.publish(PortalEvent::new(SESSION_SIGNED_IN));
/// assert_eq!(rx.try_recv().unwrap().event_type, SESSION_SIGNED_IN);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PortalEvent>,
}

impl EventBus {
    /// A full buffer drops the oldest events; slow receivers then see
    /// `RecvError::Lagged` and must reload what they cache.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: PortalEvent) {
        tracing::trace!(event_type = %event.event_type, "Publishing portal event");
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PortalEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
