//! Per-attendant live notifications.
//!
//! Each attendant may hold one subscription: a bounded queue drained by their
//! dashboard connection. Delivery is best effort. A notification for an
//! attendant with no subscription, or whose queue is full, is dropped and
//! the sender never waits.
//!
//! Registering again for the same attendant replaces the old subscription.
//! The old queue is closed, so the replaced stream ends rather than hangs.
//! Every subscription carries a generation number, and a handle dropped
//! after being replaced leaves its successor in place.

use futures::stream::{self, Stream};
use shared::SessionEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info};

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

struct Subscriber {
    generation: u64,
    sender: mpsc::Sender<SessionEvent>,
}

#[derive(Clone)]
pub struct EventBroadcaster {
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
    next_generation: Arc<AtomicU64>,
    capacity: usize,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
            capacity: capacity.max(1),
        }
    }

    /// Open a subscription for `attendant_id`, replacing any existing one
    pub fn register(&self, attendant_id: &str) -> EventSubscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let replaced = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(attendant_id.to_string(), Subscriber { generation, sender });

        if replaced.is_some() {
            info!("Replaced live subscription for attendant {}", attendant_id);
        } else {
            info!("Registered live subscription for attendant {}", attendant_id);
        }

        EventSubscription {
            attendant_id: attendant_id.to_string(),
            generation,
            receiver,
            broadcaster: self.clone(),
        }
    }

    /// Close and remove the attendant's subscription; no-op when absent
    pub fn unregister(&self, attendant_id: &str) {
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(attendant_id);
        if removed.is_some() {
            info!("Unregistered live subscription for attendant {}", attendant_id);
        }
    }

    fn unregister_generation(&self, attendant_id: &str, generation: u64) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        if subscribers
            .get(attendant_id)
            .is_some_and(|s| s.generation == generation)
        {
            subscribers.remove(attendant_id);
            debug!("Released live subscription for attendant {}", attendant_id);
        }
    }

    /// Best-effort, non-blocking delivery to one attendant.
    ///
    /// Returns whether the event was queued. Callers are free to ignore it.
    pub fn notify(&self, attendant_id: &str, event_type: &str, data: serde_json::Value) -> bool {
        let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
        let Some(subscriber) = subscribers.get(attendant_id) else {
            debug!("No live subscription for attendant {}, dropping {}", attendant_id, event_type);
            return false;
        };

        match subscriber.sender.try_send(SessionEvent::new(event_type, data)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Queue full for attendant {}, dropping {}", attendant_id, event_type);
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Queue closed for attendant {}, dropping {}", attendant_id, event_type);
                false
            }
        }
    }

    /// [`EventBroadcaster::notify`] for each recipient; returns how many were queued
    pub fn broadcast<S: AsRef<str>>(
        &self,
        attendant_ids: &[S],
        event_type: &str,
        data: serde_json::Value,
    ) -> usize {
        attendant_ids
            .iter()
            .filter(|id| self.notify(id.as_ref(), event_type, data.clone()))
            .count()
    }

    pub fn is_subscribed(&self, attendant_id: &str) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(attendant_id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Receiving end of a registration.
///
/// Dropping it (for example when the client disconnects) releases the
/// attendant's table entry if it is still the current subscription.
pub struct EventSubscription {
    attendant_id: String,
    generation: u64,
    receiver: mpsc::Receiver<SessionEvent>,
    broadcaster: EventBroadcaster,
}

impl EventSubscription {
    /// Next event, or `None` once the subscription was replaced or unregistered
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }

    /// Events that are already queued, without waiting
    pub fn try_recv(&mut self) -> Option<SessionEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> + Send + 'static {
        stream::unfold(self, |mut subscription| async move {
            subscription.recv().await.map(|event| (event, subscription))
        })
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.broadcaster
            .unregister_generation(&self.attendant_id, self.generation);
    }
}
