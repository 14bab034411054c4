use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Classification of dataset change events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PropertyChanged,
    Reloaded,
    SummaryChanged,
}

impl EventKind {
    /// Event name as seen by UI consumers.
    pub fn name(self) -> &'static str {
        match self {
            Self::PropertyChanged => "dataset-property-changed",
            Self::Reloaded => "dataset-reloaded",
            Self::SummaryChanged => "summary-changed",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A change notification, emitted after the new snapshot is installed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetEvent {
    /// A top-level property was written.
    PropertyChanged { key: String },
    /// The whole document was replaced by an import.
    Reloaded,
    /// The sample list or an annotation may have changed.
    SummaryChanged,
}

impl DatasetEvent {
    pub fn property(key: impl Into<String>) -> Self {
        Self::PropertyChanged { key: key.into() }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::PropertyChanged { .. } => EventKind::PropertyChanged,
            Self::Reloaded => EventKind::Reloaded,
            Self::SummaryChanged => EventKind::SummaryChanged,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

impl std::fmt::Display for DatasetEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PropertyChanged { key } => write!(f, "{} {{key: {key}}}", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Filter for subscribing to a subset of events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
}

impl EventFilter {
    /// Accept every event.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only(kinds: &[EventKind]) -> Self {
        Self {
            kinds: Some(kinds.to_vec()),
        }
    }

    pub fn matches(&self, event: &DatasetEvent) -> bool {
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind()),
            None => true,
        }
    }
}

/// A broadcast channel receiver for dataset events.
pub type EventStream = broadcast::Receiver<DatasetEvent>;

/// Handle returned by [`DatasetEvents::on`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&DatasetEvent) + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Listener(Listener),
    Channel(broadcast::Sender<DatasetEvent>),
}

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    sink: Sink,
}

/// Ordered registry of event subscribers.
///
/// Listeners are called synchronously, in registration order, from the
/// thread that performed the mutation. Channel subscribers receive a copy
/// of each matching event; nothing is buffered for subscribers that join
/// later. The registry lock is released before any listener runs, so a
/// listener may read the store or register further subscribers.
pub struct DatasetEvents {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    channel_capacity: usize,
}

impl DatasetEvents {
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a synchronous listener.
    pub fn on<F>(&self, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&DatasetEvent) + Send + Sync + 'static,
    {
        self.push(filter, Sink::Listener(Arc::new(listener)))
    }

    /// Register a channel subscriber. Dropping the stream unsubscribes.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        let (tx, rx) = broadcast::channel(self.channel_capacity);
        self.push(filter, Sink::Channel(tx));
        rx
    }

    /// Remove a subscriber. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|sub| sub.id != id);
        subs.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `event` to every matching subscriber, in registration order.
    pub fn emit(&self, event: &DatasetEvent) {
        let targets: Vec<(SubscriptionId, Sink)> = {
            let subs = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            subs.iter()
                .filter(|sub| sub.filter.matches(event))
                .map(|sub| (sub.id, sub.sink.clone()))
                .collect()
        };

        let mut closed = Vec::new();
        for (id, sink) in targets {
            match sink {
                Sink::Listener(listener) => listener(event),
                Sink::Channel(tx) => {
                    if tx.send(event.clone()).is_err() {
                        closed.push(id);
                    }
                }
            }
        }
        trace!(event = %event, "event delivered");

        if !closed.is_empty() {
            warn!(count = closed.len(), "pruning closed event subscribers");
            let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
            subs.retain(|sub| !closed.contains(&sub.id));
        }
    }

    fn push(&self, filter: EventFilter, sink: Sink) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { id, filter, sink });
        id
    }
}

impl Default for DatasetEvents {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for DatasetEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetEvents")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
