use crate::connection::{Broadcast, ConversationId, DeliveryReport};
use crate::message::Scope;
use crate::Manager;
use async_trait::async_trait;
use axum::body::Bytes;
use events::payload::{Contact, Conversation, Member, Payload, User};
use events::{Envelope, EventHandler, Topic};
use log::*;
use std::sync::Arc;

/// What happened to one bus message.
#[derive(Debug)]
pub enum Outcome {
    /// The message was valid and handed to the topic's subscribers.
    Delivered(DeliveryReport),
    /// A member message for a conversation nobody is watching.
    RoutingMiss { conversation_id: ConversationId },
    /// The envelope or its payload did not decode; nothing was delivered.
    Dropped(events::Error),
}

/// Routes bus messages to the subscribers of their topic.
///
/// Every message is decoded twice: once as an envelope and once as the payload
/// schema of its topic. Only messages that pass both are relayed, and they are
/// relayed as the original bytes so every subscriber sees exactly what was
/// published.
pub struct TopicRouter {
    sse_manager: Arc<Manager>,
}

impl TopicRouter {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }

    pub fn route(&self, topic: Topic, message: &[u8]) -> Outcome {
        match topic {
            Topic::User => self.handle_user(message),
            Topic::Contact => self.handle_contact(message),
            Topic::Conversation => self.handle_conversation(message),
            Topic::Member => self.handle_member(message),
        }
    }

    pub fn handle_user(&self, message: &[u8]) -> Outcome {
        self.relay::<User>(Scope::User, message)
    }

    pub fn handle_contact(&self, message: &[u8]) -> Outcome {
        self.relay::<Contact>(Scope::Contact, message)
    }

    pub fn handle_conversation(&self, message: &[u8]) -> Outcome {
        self.relay::<Conversation>(Scope::Conversation, message)
    }

    /// Member messages only reach the subscribers of the conversation named in
    /// the payload.
    pub fn handle_member(&self, message: &[u8]) -> Outcome {
        let outcome = match validate::<Member>(message) {
            Ok(member) => {
                let scope = Scope::member(member.conversation);
                self.deliver(scope, message)
            }
            Err(e) => Outcome::Dropped(e),
        };

        log_outcome(Topic::Member, &outcome);
        outcome
    }

    fn relay<P: Payload>(&self, scope: Scope, message: &[u8]) -> Outcome {
        let outcome = match validate::<P>(message) {
            Ok(_) => self.deliver(scope, message),
            Err(e) => Outcome::Dropped(e),
        };

        log_outcome(P::TOPIC, &outcome);
        outcome
    }

    fn deliver(&self, scope: Scope, message: &[u8]) -> Outcome {
        match self
            .sse_manager
            .broadcast(&scope, Bytes::copy_from_slice(message))
        {
            Broadcast::Delivered(report) => Outcome::Delivered(report),
            Broadcast::NoSubscribers => match scope {
                Scope::Member { conversation_id } => Outcome::RoutingMiss { conversation_id },
                _ => Outcome::Delivered(DeliveryReport::default()),
            },
        }
    }
}

fn validate<P: Payload>(message: &[u8]) -> Result<P, events::Error> {
    Envelope::decode(message)?.payload_as::<P>()
}

fn log_outcome(topic: Topic, outcome: &Outcome) {
    match outcome {
        Outcome::Delivered(report) => debug!(
            "Relayed {topic} event to {} subscriber(s) ({} dropped, {} evicted)",
            report.delivered, report.dropped, report.evicted
        ),
        Outcome::RoutingMiss { conversation_id } => {
            info!("No subscribers for conversation {conversation_id}")
        }
        Outcome::Dropped(e) => warn!("Dropping {topic} message: {e}"),
    }
}

#[async_trait]
impl EventHandler for TopicRouter {
    async fn handle(&self, topic: Topic, message: &[u8]) {
        self.route(topic, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::ErrorKind;
    use log::{Level, Log, Metadata, Record};
    use std::sync::{Mutex, Once};

    static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());
    static INIT: Once = Once::new();

    struct CaptureLogger;

    impl Log for CaptureLogger {
        fn enabled(&self, _: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            CAPTURED
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        INIT.call_once(|| {
            log::set_logger(&CaptureLogger).unwrap();
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    fn logged(level: Level, text: &str) -> bool {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .any(|(l, message)| *l == level && message.contains(text))
    }

    fn router() -> (Arc<Manager>, TopicRouter) {
        let manager = Arc::new(Manager::new());
        (manager.clone(), TopicRouter::new(manager))
    }

    #[tokio::test]
    async fn conversation_event_is_relayed_byte_for_byte() {
        let (manager, router) = router();
        let mut s1 = manager.subscribe(Scope::Conversation);
        let mut s2 = manager.subscribe(Scope::User);
        let raw = br#"{"type":"add","data":"{\"id\":\"c-1\",\"title\":\"Test\"}"}"#;

        router.handle(Topic::Conversation, raw).await;

        assert_eq!(&s1.recv().await.unwrap()[..], &raw[..]);
        assert!(tokio::time::timeout(std::time::Duration::from_millis(20), s1.recv())
            .await
            .is_err());
        assert!(tokio::time::timeout(std::time::Duration::from_millis(20), s2.recv())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn relayed_bytes_are_not_re_encoded() {
        let (manager, router) = router();
        let mut subscriber = manager.subscribe(Scope::User);
        // Extra whitespace and unknown fields survive untouched
        let raw = br#"{ "type" : "update", "data" : "{\"id\":\"u-1\",\"extra\":1}", "trace": "t" }"#;

        let outcome = router.handle_user(raw);

        assert!(matches!(outcome, Outcome::Delivered(report) if report.delivered == 1));
        assert_eq!(&subscriber.recv().await.unwrap()[..], &raw[..]);
    }

    #[tokio::test]
    async fn member_event_reaches_only_its_conversation() {
        let (manager, router) = router();
        let mut watching = manager.subscribe(Scope::member("c-42"));
        let other = manager.subscribe(Scope::member("c-7"));
        let flat = manager.subscribe(Scope::Conversation);
        let raw = br#"{"type":"add","data":"{\"user\":\"u-1\",\"conversation\":\"c-42\",\"pinned\":false}"}"#;

        let outcome = router.route(Topic::Member, raw);

        assert!(matches!(outcome, Outcome::Delivered(report) if report.delivered == 1));
        assert_eq!(&watching.recv().await.unwrap()[..], &raw[..]);
        assert!(other.is_empty());
        assert!(flat.is_empty());
    }

    #[test]
    fn member_event_for_unwatched_conversation_is_a_routing_miss() {
        capture_logs();
        let (manager, router) = router();
        let m1 = manager.subscribe(Scope::member("c-42"));
        let raw = br#"{"type":"add","data":"{\"user\":\"u-1\",\"conversation\":\"c-43\",\"pinned\":true}"}"#;

        let outcome = router.handle_member(raw);

        assert!(matches!(
            outcome,
            Outcome::RoutingMiss { ref conversation_id } if conversation_id == "c-43"
        ));
        assert!(m1.is_empty());
        assert!(logged(Level::Info, "No subscribers for conversation c-43"));
    }

    #[test]
    fn malformed_envelopes_are_dropped_on_every_topic() {
        capture_logs();
        let (manager, router) = router();
        let subscribers = vec![
            manager.subscribe(Scope::User),
            manager.subscribe(Scope::Contact),
            manager.subscribe(Scope::Conversation),
            manager.subscribe(Scope::member("c-1")),
        ];

        for topic in Topic::ALL {
            let outcome = router.route(topic, br#"{"type":"add","data":"{\"id\""#);
            assert!(matches!(
                outcome,
                Outcome::Dropped(ref e) if e.error_kind == ErrorKind::MalformedEnvelope
            ));
            assert!(logged(Level::Warn, &format!("Dropping {topic} message")));
        }

        for subscriber in subscribers.iter() {
            assert!(subscriber.is_empty());
        }
    }

    #[test]
    fn array_payloads_are_dropped_on_every_topic() {
        let (manager, router) = router();
        let subscribers = vec![
            manager.subscribe(Scope::User),
            manager.subscribe(Scope::Contact),
            manager.subscribe(Scope::Conversation),
            manager.subscribe(Scope::member("c-1")),
        ];

        for topic in Topic::ALL {
            for raw in [
                &br#"{"type":"add","data":"[]"}"#[..],
                br#"{"type":"add","data":"[\"u\",\"c-1\"]"}"#,
            ] {
                let outcome = router.route(topic, raw);
                assert!(
                    matches!(
                        outcome,
                        Outcome::Dropped(ref e) if e.error_kind == ErrorKind::MalformedPayload(topic)
                    ),
                    "{topic}: {outcome:?}"
                );
            }
        }

        for subscriber in subscribers.iter() {
            assert!(subscriber.is_empty());
        }
    }

    #[test]
    fn payloads_with_mistyped_fields_are_dropped() {
        let (manager, router) = router();
        let subscriber = manager.subscribe(Scope::Contact);

        let outcome = router.handle_contact(br#"{"type":"add","data":"{\"user\":1}"}"#);

        assert!(matches!(
            outcome,
            Outcome::Dropped(ref e) if e.error_kind == ErrorKind::MalformedPayload(Topic::Contact)
        ));
        assert!(subscriber.is_empty());
    }

    #[test]
    fn member_payload_without_conversation_is_a_routing_miss() {
        capture_logs();
        let (manager, router) = router();
        let subscriber = manager.subscribe(Scope::member("c-1"));

        let outcome = router.handle_member(br#"{"type":"delete","data":"{\"user\":\"u-1\"}"}"#);

        assert!(matches!(
            outcome,
            Outcome::RoutingMiss { ref conversation_id } if conversation_id.is_empty()
        ));
        assert!(subscriber.is_empty());
        assert!(logged(Level::Info, "No subscribers for conversation "));
    }

    #[test]
    fn flat_topic_without_subscribers_is_delivered_to_nobody() {
        let (_manager, router) = router();

        let outcome = router.handle_user(br#"{"type":"add","data":"{\"id\":\"u-1\"}"}"#);

        assert!(matches!(outcome, Outcome::Delivered(report) if report == DeliveryReport::default()));
    }
}
