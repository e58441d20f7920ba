use crate::error::{Error, ErrorKind};
use events::payload::Payload;
use events::{Envelope, Kind};
use log::*;

/// Publishes change notifications for committed CRUD operations.
///
/// The subject is derived from the payload type, so a payload can only ever be
/// published on the topic whose schema it satisfies.
#[derive(Clone)]
pub struct BusPublisher {
    client: async_nats::Client,
}

impl BusPublisher {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }

    /// Build the subject and encoded envelope for a change notification.
    pub fn message<P: Payload>(kind: Kind, payload: &P) -> Result<(&'static str, Vec<u8>), Error> {
        let envelope = Envelope::new(kind, payload)?;
        Ok((P::TOPIC.subject(), envelope.encode()?))
    }

    pub async fn publish<P: Payload>(&self, kind: Kind, payload: &P) -> Result<(), Error> {
        let (subject, bytes) = Self::message(kind, payload)?;

        self.client
            .publish(subject.to_string(), bytes.into())
            .await
            .map_err(|e| Error::new(ErrorKind::Publish, e))?;

        debug!("Published {kind:?} notification on \"{subject}\"");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::payload::{Contact, Conversation, Member};

    #[test]
    fn message_targets_the_payload_topic_subject() {
        let (subject, _) = BusPublisher::message(Kind::Add, &Contact::default()).unwrap();
        assert_eq!(subject, "contact");

        let member = Member {
            user: "u-1".to_string(),
            conversation: "c-1".to_string(),
            pinned: false,
        };
        let (subject, _) = BusPublisher::message(Kind::Delete, &member).unwrap();
        assert_eq!(subject, "member");
    }

    #[test]
    fn message_body_is_an_envelope_with_a_string_payload() {
        let conversation = Conversation {
            id: "c-1".to_string(),
            title: "Test".to_string(),
            ..Default::default()
        };

        let (_, bytes) = BusPublisher::message(Kind::Update, &conversation).unwrap();

        let envelope = Envelope::decode(&bytes).unwrap();
        assert_eq!(envelope.kind, Kind::Update);
        assert_eq!(envelope.payload_as::<Conversation>().unwrap(), conversation);
    }
}
