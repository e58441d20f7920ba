//! NATS adapter for the chat relay.
//!
//! The CRUD side publishes one envelope per committed change on the subject of
//! the affected topic ([`BusPublisher`]). The relay keeps one subscription per
//! topic subject for its whole lifetime and hands every message to an
//! [`EventDispatcher`] ([`BusAdapter`]).
//!
//! Each topic is consumed by its own task, so messages of one topic are dispatched
//! in the order the bus delivered them. Delivery is at most once: a message that
//! fails to decode is dropped by the handlers and never redelivered.

use events::{EventDispatcher, Topic};
use futures::{Stream, StreamExt};
use log::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod error;
pub mod publisher;

pub use error::{Error, ErrorKind};
pub use publisher::BusPublisher;

/// Connect to a NATS server.
pub async fn connect(url: &str) -> Result<async_nats::Client, Error> {
    let client = async_nats::connect(url)
        .await
        .map_err(|e| Error::new(ErrorKind::Connect, e))?;
    info!("Connected to NATS at {url}");
    Ok(client)
}

pub struct BusAdapter {
    client: async_nats::Client,
}

impl BusAdapter {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Subscribe to every topic subject and start one consuming task per topic.
    ///
    /// All subscriptions are established before any task is spawned, so an error
    /// leaves nothing running. The tasks end when `shutdown` is cancelled or the
    /// connection closes; dropping a subscriber unsubscribes it.
    pub async fn start(
        &self,
        dispatcher: EventDispatcher,
        shutdown: CancellationToken,
    ) -> Result<Vec<JoinHandle<()>>, Error> {
        let mut subscribers = Vec::with_capacity(Topic::ALL.len());
        for topic in Topic::ALL {
            let subscriber = self
                .client
                .subscribe(topic.subject().to_string())
                .await
                .map_err(|e| Error::new(ErrorKind::Subscribe, e))?;
            info!("Subscribed to bus subject \"{}\"", topic.subject());
            subscribers.push((topic, subscriber));
        }

        Ok(subscribers
            .into_iter()
            .map(|(topic, subscriber)| {
                let messages = subscriber.map(|message| message.payload);
                tokio::spawn(pump(
                    topic,
                    messages,
                    dispatcher.clone(),
                    shutdown.clone(),
                ))
            })
            .collect())
    }
}

/// Dispatch every message of `messages` as received on `topic`, one at a time and
/// in arrival order, until the stream ends or `shutdown` is cancelled.
pub async fn pump<S>(
    topic: Topic,
    mut messages: S,
    dispatcher: EventDispatcher,
    shutdown: CancellationToken,
) where
    S: Stream + Unpin,
    S::Item: AsRef<[u8]>,
{
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                info!("Stopping bus consumer for \"{topic}\"");
                break;
            }
            next = messages.next() => match next {
                Some(message) => dispatcher.dispatch(topic, message.as_ref()).await,
                None => {
                    warn!("Bus subscription for \"{topic}\" closed");
                    break;
                }
            }
        }
    }
}
