//! Per-provider EIP-1193 event registry.
//!
//! Listeners are registered per [`EventKind`] and identified by the
//! [`ListenerId`] returned from [`EventRegistry::on`]. The registry lives
//! exactly as long as the provider that owns it.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::Address;
use dashmap::DashMap;
use serde_json::Value;

use crate::error::RpcErrorObject;

/// Event kinds defined by EIP-1193.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `connect`
    Connect,
    /// `disconnect`
    Disconnect,
    /// `accountsChanged`
    AccountsChanged,
    /// `chainChanged`
    ChainChanged,
    /// `message`
    Message,
}

impl EventKind {
    /// The EIP-1193 event name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to provider listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// The provider can serve requests for `chain_id` (hex).
    Connect {
        /// Hex chain id.
        chain_id: String,
    },
    /// The session ended.
    Disconnect(RpcErrorObject),
    /// The exposed accounts changed; empty means none are available.
    AccountsChanged(Vec<Address>),
    /// The current chain changed (hex chain id).
    ChainChanged(String),
    /// A provider message.
    Message {
        /// Message type.
        kind: String,
        /// Message payload.
        data: Value,
    },
}

impl ProviderEvent {
    /// Kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Connect { .. } => EventKind::Connect,
            Self::Disconnect(_) => EventKind::Disconnect,
            Self::AccountsChanged(_) => EventKind::AccountsChanged,
            Self::ChainChanged(_) => EventKind::ChainChanged,
            Self::Message { .. } => EventKind::Message,
        }
    }
}

/// Handle for removing a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A registered event callback.
pub type Listener = Arc<dyn Fn(&ProviderEvent) + Send + Sync>;

/// Listener registry owned by one provider instance.
#[derive(Default)]
pub struct EventRegistry {
    listeners: DashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&ProviderEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener; returns whether it was registered.
    pub fn remove_listener(&self, kind: EventKind, id: ListenerId) -> bool {
        self.listeners.get_mut(&kind).is_some_and(|mut entries| {
            let before = entries.len();
            entries.retain(|(existing, _)| *existing != id);
            entries.len() != before
        })
    }

    /// Delivers `event` to every listener of its kind, in registration order.
    pub fn emit(&self, event: &ProviderEvent) {
        // Snapshot so listeners may (un)register without deadlocking the shard.
        let listeners: Vec<Listener> = self
            .listeners
            .get(&event.kind())
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        #[cfg(feature = "telemetry")]
        tracing::trace!(event = %event.kind(), listeners = listeners.len(), "Emitting provider event");
        for listener in listeners {
            listener(event);
        }
    }

    /// Total number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.iter().map(|e| e.value().len()).sum()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let registry = EventRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        registry.on(EventKind::ChainChanged, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        registry.emit(&ProviderEvent::ChainChanged("0x89".into()));
        registry.emit(&ProviderEvent::AccountsChanged(vec![]));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[ProviderEvent::ChainChanged("0x89".into())]);
    }

    #[test]
    fn test_remove_listener() {
        let registry = EventRegistry::new();
        let count = Arc::new(AtomicU64::new(0));
        let c = Arc::clone(&count);
        let id = registry.on(EventKind::AccountsChanged, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&ProviderEvent::AccountsChanged(vec![]));
        assert!(registry.remove_listener(EventKind::AccountsChanged, id));
        assert!(!registry.remove_listener(EventKind::AccountsChanged, id));
        registry.emit(&ProviderEvent::AccountsChanged(vec![]));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listener_may_register_during_emit() {
        let registry = Arc::new(EventRegistry::new());
        let inner = Arc::clone(&registry);
        registry.on(EventKind::Connect, move |_| {
            inner.on(EventKind::Connect, |_| {});
        });
        registry.emit(&ProviderEvent::Connect {
            chain_id: "0x1".into(),
        });
        assert_eq!(registry.len(), 2);
    }
}
