//! Error types for the `events` crate.
//!
//! Follows the same pattern as the other crates: a root `Error` struct holding an
//! `error_kind` and the optional underlying `source`.

use crate::topic::Topic;
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The outer envelope structure could not be decoded.
    MalformedEnvelope,
    /// The envelope decoded, but its `data` does not match the topic's schema.
    MalformedPayload(Topic),
    /// A payload could not be serialized into an envelope.
    Encode,
}

impl Error {
    pub(crate) fn malformed_envelope(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::MalformedEnvelope,
        }
    }

    pub(crate) fn malformed_payload(topic: Topic, err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::MalformedPayload(topic),
        }
    }

    pub(crate) fn encode(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Encode,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::MalformedEnvelope => write!(f, "malformed envelope")?,
            ErrorKind::MalformedPayload(topic) => write!(f, "malformed {topic} payload")?,
            ErrorKind::Encode => write!(f, "failed to encode envelope")?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}
