//! Long-lived client streams.
//!
//! A session registers one subscriber and turns it into a `text/event-stream`
//! response. The event loop waits for whichever comes first: a relayed message or
//! the shutdown signal. Idle streams get a keep-alive comment from the response
//! itself, and its timer restarts after every event. The session ends on
//! shutdown, on eviction by the registry, or when the response body is dropped
//! because the client went away. In every case the subscriber is unregistered.

use crate::message::{self, Scope};
use crate::Manager;
use async_stream::stream;
use axum::body::Bytes;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use log::*;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Idle interval after which a keep-alive comment is written.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(25);

enum Trigger {
    Message(Option<Bytes>),
    Shutdown,
}

/// Open a stream session on `scope`.
///
/// Registration happens when the body is first polled, so nothing is buffered
/// for a response that is never sent.
pub fn open(
    manager: Arc<Manager>,
    scope: Scope,
    keep_alive: Duration,
    shutdown: CancellationToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let keep_alive = keep_alive.max(Duration::from_millis(1));

    let events = stream! {
        let mut subscription = manager.subscribe(scope);
        let id = subscription.id().clone();
        debug!("Session {id} streaming {}", subscription.scope());

        loop {
            let trigger = tokio::select! {
                next = subscription.recv() => Trigger::Message(next),
                _ = shutdown.cancelled() => Trigger::Shutdown,
            };

            match trigger {
                Trigger::Message(Some(payload)) => {
                    yield Ok::<_, Infallible>(message::data_event(&payload));
                }
                Trigger::Message(None) => {
                    warn!("Subscriber {id} was removed by the registry, closing its stream");
                    break;
                }
                Trigger::Shutdown => {
                    debug!("Shutdown requested, closing stream for subscriber {id}");
                    break;
                }
            }
        }

        debug!("Session {id} closed");
    };

    Sse::new(events).keep_alive(KeepAlive::new().interval(keep_alive))
}
