//! Server-Sent Events (SSE) fan-out for real-time updates.
//!
//! This crate relays change notifications received from the message bus to every
//! client stream currently watching the affected resource type.
//!
//! # Architecture
//!
//! - **Per-topic registries**: one subscriber map per flat topic (user, contact,
//!   conversation) plus a conversation-indexed map for member streams, all
//!   DashMap based so registration and broadcast never take a global lock.
//! - **Bounded buffers**: each subscriber owns a bounded channel; a broadcast never
//!   waits on a slow client (see `SlowConsumerPolicy`).
//! - **Byte-for-byte relay**: validated messages are forwarded as published.
//! - **Ephemeral messages**: a client that is offline misses the event and sees
//!   fresh data on next load. There is no replay.
//!
//! # Message Flow
//!
//! 1. Client opens a stream on one of the `/user/subscribe` endpoints
//! 2. `session::open` registers a subscriber for the stream's `Scope`
//! 3. The bus adapter hands every message to `TopicRouter`
//! 4. The router decodes the envelope and the topic payload, then asks the
//!    `Manager` to broadcast the raw bytes to the matching scope
//! 5. The session writes each message as one `data:` event; the response sends `:` comments
//!    while idle
//! 6. On disconnect, eviction or shutdown the subscriber is unregistered
//!
//! # Modules
//!
//! - `connection`: SubscriberRegistry, SubscriberId and the backpressure policy
//! - `manager`: Manager facade and the self-unregistering Subscription
//! - `message`: Scope and the data event built from a relayed message
//! - `session`: the per-connection stream loop
//! - `topic_router`: decode, validate and route bus messages

pub mod connection;
pub mod manager;
pub mod message;
pub mod session;
pub mod topic_router;

pub use manager::Manager;
pub use topic_router::TopicRouter;
