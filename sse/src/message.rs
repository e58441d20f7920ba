use crate::connection::ConversationId;
use axum::response::sse::Event;
use events::Topic;
use std::fmt;

/// Which subscriber group a stream listens to, and which group a relayed
/// message is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Every user change
    User,
    /// Every contact change
    Contact,
    /// Every conversation change
    Conversation,
    /// Membership changes of a single conversation
    Member { conversation_id: ConversationId },
}

impl Scope {
    /// The scope of a topic that is not partitioned by a secondary key.
    /// Returns `None` for [`Topic::Member`], which needs a conversation id.
    pub fn flat(topic: Topic) -> Option<Scope> {
        match topic {
            Topic::User => Some(Scope::User),
            Topic::Contact => Some(Scope::Contact),
            Topic::Conversation => Some(Scope::Conversation),
            Topic::Member => None,
        }
    }

    pub fn member(conversation_id: impl Into<ConversationId>) -> Scope {
        Scope::Member {
            conversation_id: conversation_id.into(),
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Scope::User => Topic::User,
            Scope::Contact => Topic::Contact,
            Scope::Conversation => Topic::Conversation,
            Scope::Member { .. } => Topic::Member,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Scope::Member { conversation_id } => write!(f, "member:{conversation_id}"),
            flat => write!(f, "{}", flat.topic()),
        }
    }
}

/// Builds the event relaying one bus message.
///
/// Every line of the payload becomes its own `data:` field so clients reassemble
/// it with line breaks intact. `\r\n` and lone `\r` count as line breaks, the way
/// event-stream parsers read them.
pub fn data_event(payload: &[u8]) -> Event {
    let text = String::from_utf8_lossy(payload);
    Event::default().data(text.replace("\r\n", "\n").replace('\r', "\n"))
}
