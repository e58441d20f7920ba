use crate::message::Scope;
use axum::body::Bytes;
use dashmap::DashMap;
use log::*;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Conversation identifiers are opaque strings minted by the CRUD layer.
pub type ConversationId = String;

/// Per-subscriber buffer used when none is configured.
pub const DEFAULT_CAPACITY: usize = 64;

type Channel = mpsc::Sender<Bytes>;
type SubscriberMap = DashMap<SubscriberId, Channel>;

/// Unique identifier for a subscriber (server-generated, one per connection)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a broadcast does with a subscriber whose buffer is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlowConsumerPolicy {
    /// Remove the subscriber. Its stream drains what is buffered and then ends,
    /// prompting the client to reconnect and refetch.
    #[default]
    Disconnect,
    /// Skip this message for this subscriber only.
    Drop,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown slow consumer policy: {}", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for SlowConsumerPolicy {
    type Err = ParsePolicyError;

    fn from_str(policy: &str) -> Result<Self, Self::Err> {
        match policy.to_lowercase().as_str() {
            "disconnect" => Ok(SlowConsumerPolicy::Disconnect),
            "drop" => Ok(SlowConsumerPolicy::Drop),
            _ => Err(ParsePolicyError(policy.to_string())),
        }
    }
}

impl fmt::Display for SlowConsumerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SlowConsumerPolicy::Disconnect => write!(f, "disconnect"),
            SlowConsumerPolicy::Drop => write!(f, "drop"),
        }
    }
}

/// Per-broadcast delivery accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Subscribers the message was queued for
    pub delivered: usize,
    /// Subscribers that skipped the message because their buffer was full
    pub dropped: usize,
    /// Subscribers removed during this broadcast (closed or too slow)
    pub evicted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    Delivered(DeliveryReport),
    /// No subscriber group exists for the conversation of a member broadcast.
    NoSubscribers,
}

/// Subscriber registry with one map per flat topic and a lazily built
/// conversation index for member subscribers.
///
/// Broadcasting never waits on a subscriber: every subscriber owns a bounded
/// buffer and a full buffer is handled by the [`SlowConsumerPolicy`].
pub struct SubscriberRegistry {
    capacity: usize,
    policy: SlowConsumerPolicy,

    users: SubscriberMap,
    contacts: SubscriberMap,
    conversations: SubscriberMap,

    /// conversation_id -> (subscriber -> channel). Mutation and iteration of one
    /// conversation's group happen under that entry's shard lock.
    members: DashMap<ConversationId, HashMap<SubscriberId, Channel>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_CAPACITY, SlowConsumerPolicy::default())
    }

    pub fn with_options(capacity: usize, policy: SlowConsumerPolicy) -> Self {
        Self {
            capacity: capacity.max(1),
            policy,
            users: DashMap::new(),
            contacts: DashMap::new(),
            conversations: DashMap::new(),
            members: DashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> SlowConsumerPolicy {
        self.policy
    }

    /// Create a channel for `id` under `scope` and return its receiving half.
    pub fn register(&self, scope: &Scope, id: SubscriberId) -> mpsc::Receiver<Bytes> {
        let (sender, receiver) = mpsc::channel(self.capacity);

        match self.flat(scope) {
            Some(subscribers) => {
                subscribers.insert(id, sender);
            }
            None => {
                if let Scope::Member { conversation_id } = scope {
                    self.members
                        .entry(conversation_id.clone())
                        .or_default()
                        .insert(id, sender);
                }
            }
        }

        receiver
    }

    /// Remove `id` from `scope`. Unknown ids are ignored.
    pub fn unregister(&self, scope: &Scope, id: &SubscriberId) {
        if let Some(subscribers) = self.flat(scope) {
            subscribers.remove(id);
            return;
        }

        if let Scope::Member { conversation_id } = scope {
            let emptied = match self.members.get_mut(conversation_id) {
                Some(mut subscribers) => {
                    subscribers.remove(id);
                    subscribers.is_empty()
                }
                None => false,
            };

            // Clean up empty conversation entries; re-checked under the write lock
            // in case a subscriber joined in between
            if emptied {
                self.members
                    .remove_if(conversation_id, |_, subscribers| subscribers.is_empty());
            }
        }
    }

    /// Queue `payload` for every subscriber currently registered under `scope`.
    pub fn broadcast(&self, scope: &Scope, payload: &Bytes) -> Broadcast {
        let mut report = DeliveryReport::default();
        let mut evict = Vec::new();

        match self.flat(scope) {
            Some(subscribers) => {
                for entry in subscribers.iter() {
                    self.offer(entry.key(), entry.value(), payload, &mut report, &mut evict);
                }
            }
            None => {
                let Scope::Member { conversation_id } = scope else {
                    return Broadcast::NoSubscribers;
                };
                let Some(subscribers) = self.members.get(conversation_id) else {
                    return Broadcast::NoSubscribers;
                };
                for (id, channel) in subscribers.iter() {
                    self.offer(id, channel, payload, &mut report, &mut evict);
                }
            }
        }

        for id in evict {
            self.unregister(scope, &id);
            report.evicted += 1;
        }

        Broadcast::Delivered(report)
    }

    pub fn subscriber_count(&self, scope: &Scope) -> usize {
        match self.flat(scope) {
            Some(subscribers) => subscribers.len(),
            None => match scope {
                Scope::Member { conversation_id } => self
                    .members
                    .get(conversation_id)
                    .map(|subscribers| subscribers.len())
                    .unwrap_or(0),
                _ => 0,
            },
        }
    }

    /// Number of conversations with at least one member subscriber.
    pub fn conversation_count(&self) -> usize {
        self.members.len()
    }

    fn flat(&self, scope: &Scope) -> Option<&SubscriberMap> {
        match scope {
            Scope::User => Some(&self.users),
            Scope::Contact => Some(&self.contacts),
            Scope::Conversation => Some(&self.conversations),
            Scope::Member { .. } => None,
        }
    }

    fn offer(
        &self,
        id: &SubscriberId,
        channel: &Channel,
        payload: &Bytes,
        report: &mut DeliveryReport,
        evict: &mut Vec<SubscriberId>,
    ) {
        match channel.try_send(payload.clone()) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => match self.policy {
                SlowConsumerPolicy::Disconnect => {
                    warn!("Subscriber {id} is not keeping up, disconnecting it");
                    evict.push(id.clone());
                }
                SlowConsumerPolicy::Drop => {
                    warn!("Subscriber {id} buffer is full, dropping message");
                    report.dropped += 1;
                }
            },
            Err(TrySendError::Closed(_)) => {
                debug!("Subscriber {id} is gone, removing it");
                evict.push(id.clone());
            }
        }
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
