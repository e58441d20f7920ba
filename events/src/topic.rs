use std::fmt;

/// The resource types whose changes are relayed to clients. Each topic is
/// published on exactly one bus subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    User,
    Contact,
    Conversation,
    Member,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::User,
        Topic::Contact,
        Topic::Conversation,
        Topic::Member,
    ];

    /// The bus subject this topic is published on.
    pub fn subject(&self) -> &'static str {
        match self {
            Topic::User => "user",
            Topic::Contact => "contact",
            Topic::Conversation => "conversation",
            Topic::Member => "member",
        }
    }

    pub fn from_subject(subject: &str) -> Option<Topic> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.subject() == subject)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.subject())
    }
}
