//! SSE HTTP handlers for the web layer.
//!
//! This module contains only the Axum handlers for the streaming endpoints.
//! The fan-out machinery (Manager, SubscriberRegistry, stream sessions) lives in
//! the `sse` crate.

pub mod handler;
