//! Broadcast bus for lifecycle announcements

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::types::{Event, EventEnvelope};

/// Capacity of the process-wide bus
pub const DEFAULT_CAPACITY: usize = 1000;

/// Largest capacity a bus is created with; larger requests are clamped
pub const MAX_CAPACITY: usize = 1 << 16;

static GLOBAL: OnceLock<EventBus> = OnceLock::new();

/// Fan-out channel for [`Event`]s. Clones publish to the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    emitted: Arc<AtomicUsize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A private bus. Subscribers lagging more than `capacity` events behind
    /// skip the oldest ones. `capacity` is clamped to `1..=MAX_CAPACITY`.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.clamp(1, MAX_CAPACITY));
        Self {
            sender,
            emitted: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The bus bootstrappers announce on unless given their own
    pub fn global() -> &'static EventBus {
        GLOBAL.get_or_init(EventBus::new)
    }

    /// Send an envelope to current subscribers and return how many got it.
    /// With nobody listening the envelope is dropped.
    pub fn publish(&self, envelope: EventEnvelope) -> usize {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        self.sender.send(envelope).unwrap_or(0)
    }

    pub fn emit(&self, event: Event) -> usize {
        self.publish(EventEnvelope::new(event))
    }

    /// Receive everything published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Envelopes published so far, whether or not anyone received them
    pub fn event_count(&self) -> usize {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("emitted", &self.event_count())
            .finish()
    }
}

/// Wait on `rx` until `event` arrives, skipping anything else.
///
/// Returns `None` once every sender is gone.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<EventEnvelope>,
    event: Event,
) -> Option<EventEnvelope> {
    loop {
        match rx.recv().await {
            Ok(envelope) if envelope.event == event => return Some(envelope),
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return None,
        }
    }
}
