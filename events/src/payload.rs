//! Payload schemas carried in an envelope's `data` field, one per topic.
//!
//! Fields the publisher leaves out fall back to their defaults; a payload is only
//! rejected when it is not a JSON object or a field has the wrong type.

use crate::topic::Topic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A payload schema bound to the topic it is published on.
pub trait Payload: Serialize + DeserializeOwned {
    const TOPIC: Topic;
}

/// Decode `json` as the payload schema `P`.
///
/// Derived struct deserializers also accept a JSON array and fill the fields by
/// position, so the input is first required to be an object.
pub fn decode<P: Payload>(json: &str) -> Result<P, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_str(json)?;
    P::deserialize(Value::Object(object))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub username: Option<String>,
    pub bio: String,
    pub profile_pic: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

impl Payload for User {
    const TOPIC: Topic = Topic::User;
}

/// A directed contact relation: `user` added `contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub user: String,
    pub contact: String,
}

impl Payload for Contact {
    const TOPIC: Topic = Topic::Contact;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub dm: bool,
    pub picture: String,
    pub pinned: bool,
}

impl Payload for Conversation {
    const TOPIC: Topic = Topic::Conversation;
}

/// Membership of `user` in `conversation`.
///
/// A missing `conversation` decodes as the empty id, which no stream watches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Member {
    pub user: String,
    pub conversation: String,
    pub pinned: bool,
}

impl Payload for Member {
    const TOPIC: Topic = Topic::Member;
}
