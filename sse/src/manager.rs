use crate::connection::{Broadcast, SlowConsumerPolicy, SubscriberId, SubscriberRegistry};
use crate::message::Scope;
use axum::body::Bytes;
use log::*;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Manager {
    registry: Arc<SubscriberRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self::with_registry(SubscriberRegistry::new())
    }

    pub fn with_options(capacity: usize, policy: SlowConsumerPolicy) -> Self {
        Self::with_registry(SubscriberRegistry::with_options(capacity, policy))
    }

    pub fn with_registry(registry: SubscriberRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Register a new subscriber under `scope`. The subscriber stays registered
    /// until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, scope: Scope) -> Subscription {
        let id = SubscriberId::new();
        let receiver = self.registry.register(&scope, id.clone());
        info!("Registered subscriber {id} on {scope}");

        Subscription {
            id,
            scope,
            receiver,
            registry: Arc::clone(&self.registry),
        }
    }

    /// Unregister a subscriber by ID. Safe to call for ids that are already gone.
    pub fn unsubscribe(&self, scope: &Scope, id: &SubscriberId) {
        self.registry.unregister(scope, id);
    }

    /// Relay `payload` to every subscriber of `scope`.
    pub fn broadcast(&self, scope: &Scope, payload: Bytes) -> Broadcast {
        self.registry.broadcast(scope, &payload)
    }

    pub fn subscriber_count(&self, scope: &Scope) -> usize {
        self.registry.subscriber_count(scope)
    }

    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// The receiving side of one registered subscriber, exclusively owned by the
/// stream session that created it.
pub struct Subscription {
    id: SubscriberId,
    scope: Scope,
    receiver: mpsc::Receiver<Bytes>,
    registry: Arc<SubscriberRegistry>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriberId {
        &self.id
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Wait for the next relayed message. Returns `None` once the registry has
    /// dropped this subscriber and everything buffered has been read.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.receiver.recv().await
    }

    /// Whether nothing is currently buffered for this subscriber.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        info!("Unregistering subscriber {} from {}", self.id, self.scope);
        self.registry.unregister(&self.scope, &self.id);
    }
}
