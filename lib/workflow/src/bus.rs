//! Per-workflow event fanout.
//!
//! Each subscription owns a bounded queue. Publishing never waits: a
//! subscriber whose queue is full is disconnected, and one whose receiver is
//! gone is dropped from the registry. Publishes for a workflow are delivered
//! to each subscriber in the order they were made.

use crate::event::ExecutionEvent;
use callflow_core::WorkflowId;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio_stream::Stream;
use tracing::{debug, warn};

/// Default per-subscriber queue length.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Identifies one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Subscriber {
    id: SubscriptionId,
    sender: mpsc::Sender<ExecutionEvent>,
}

struct Registry {
    capacity: usize,
    next_id: AtomicU64,
    topics: Mutex<HashMap<WorkflowId, Vec<Subscriber>>>,
}

impl Registry {
    fn remove(&self, workflow_id: &WorkflowId, id: SubscriptionId) -> bool {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(subscribers) = topics.get_mut(workflow_id) else {
            return false;
        };
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            topics.remove(workflow_id);
        }
        removed
    }
}

/// Multicast channel for execution events, keyed by workflow.
///
/// Cloning is cheap and every clone shares the same subscribers.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    /// Creates a bus with the default queue length.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Creates a bus whose subscribers buffer up to `capacity` events.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry {
                capacity: capacity.max(1),
                next_id: AtomicU64::new(1),
                topics: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Returns the per-subscriber queue length.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.registry.capacity
    }

    /// Registers a new subscriber for a workflow.
    #[must_use]
    pub fn subscribe(&self, workflow_id: &WorkflowId) -> Subscription {
        let id = SubscriptionId(self.registry.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::channel(self.registry.capacity);

        self.registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(workflow_id.clone())
            .or_default()
            .push(Subscriber { id, sender });

        debug!(%workflow_id, subscription = %id, "subscriber registered");
        Subscription {
            id,
            workflow_id: workflow_id.clone(),
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Removes a subscription. Returns false if it was already gone.
    ///
    /// Events already queued for the subscription can still be received.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let removed = self
            .registry
            .remove(&subscription.workflow_id, subscription.id);
        if removed {
            debug!(workflow_id = %subscription.workflow_id, subscription = %subscription.id, "subscriber removed");
        }
        removed
    }

    /// Delivers an event to every subscriber of its workflow.
    ///
    /// Returns how many subscribers accepted the event. Publishing to a
    /// workflow without subscribers does nothing.
    pub fn publish(&self, event: &ExecutionEvent) -> usize {
        let mut topics = self
            .registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(subscribers) = topics.get_mut(&event.workflow_id) else {
            return 0;
        };

        let mut delivered = 0;
        subscribers.retain(|subscriber| match subscriber.sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    workflow_id = %event.workflow_id,
                    subscription = %subscriber.id,
                    "subscriber queue full, disconnecting"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    workflow_id = %event.workflow_id,
                    subscription = %subscriber.id,
                    "subscriber gone"
                );
                false
            }
        });

        if subscribers.is_empty() {
            topics.remove(&event.workflow_id);
        }
        delivered
    }

    /// Returns the number of live subscribers for a workflow.
    #[must_use]
    pub fn subscriber_count(&self, workflow_id: &WorkflowId) -> usize {
        self.registry
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(workflow_id)
            .map_or(0, Vec::len)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A live registration on an [`EventBus`].
///
/// Dropping the subscription unregisters it. It is also a [`Stream`] of
/// events that ends once the subscriber has been removed and its queue
/// drained.
pub struct Subscription {
    id: SubscriptionId,
    workflow_id: WorkflowId,
    receiver: mpsc::Receiver<ExecutionEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Returns the subscription ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the workflow this subscription observes.
    #[must_use]
    pub fn workflow_id(&self) -> &WorkflowId {
        &self.workflow_id
    }

    /// Waits for the next event. Returns `None` once disconnected and drained.
    pub async fn recv(&mut self) -> Option<ExecutionEvent> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    ///
    /// # Errors
    ///
    /// Returns `TryRecvError::Empty` if nothing is queued and
    /// `TryRecvError::Disconnected` once removed and drained.
    pub fn try_recv(&mut self) -> Result<ExecutionEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drains every queued event.
    pub fn drain(&mut self) -> Vec<ExecutionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Stream for Subscription {
    type Item = ExecutionEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.workflow_id, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("workflow_id", &self.workflow_id)
            .finish_non_exhaustive()
    }
}
