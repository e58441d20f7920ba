//! Event system infrastructure for the chat relay.
//!
//! This crate defines the wire contract shared by the CRUD side (which publishes
//! change notifications to the message bus) and the fan-out side (which relays them
//! to connected clients).
//!
//! # Architecture
//!
//! - **Envelope**: `{ "type": "add"|"update"|"delete", "data": "<json string>" }`,
//!   the outer structure of every bus message
//! - **Topic**: the closed set of resource types, one bus subject each
//! - **Payloads**: the per-topic schemas an envelope's `data` must satisfy
//! - **EventHandler**: trait for consuming raw bus messages
//! - **EventDispatcher**: fans a raw bus message out to registered handlers
//!
//! This crate has no dependencies on internal crates, avoiding circular dependencies.

use async_trait::async_trait;
use log::*;
use std::sync::Arc;

pub mod envelope;
pub mod error;
pub mod payload;
pub mod topic;

pub use envelope::{Envelope, Kind};
pub use error::{Error, ErrorKind};
pub use topic::Topic;

/// Trait for handling raw bus messages received on a topic's subject.
///
/// Implementations must not block: handlers run inline on the bus delivery path,
/// which is shared by every message of the topic.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, topic: Topic, message: &[u8]);
}

/// Dispatches bus messages to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventDispatcher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new dispatcher instance with the additional handler.
    /// Hand the returned dispatcher to the bus adapter.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch a raw message received on `topic` to all registered handlers.
    pub async fn dispatch(&self, topic: Topic, message: &[u8]) {
        trace!(
            "Dispatching {} byte {topic} message to {} handler(s)",
            message.len(),
            self.handlers.len()
        );
        for handler in self.handlers.iter() {
            handler.handle(topic, message).await;
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
