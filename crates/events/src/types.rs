//! Event types for bootstrapper notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: Event,
}

impl EventEnvelope {
    /// Create a new event envelope with auto-generated ID and timestamp
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Lifecycle events. They carry nothing beyond their type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Startup sequence finished
    #[serde(rename = "aurelia-started")]
    Started,

    /// Root view model was composed into the host
    #[serde(rename = "aurelia-composed")]
    Composed,
}

impl Event {
    /// The discriminator tag listeners match on
    pub fn type_tag(&self) -> &'static str {
        match self {
            Event::Started => "aurelia-started",
            Event::Composed => "aurelia-composed",
        }
    }
}
