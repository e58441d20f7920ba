use crate::error::Error;
use crate::payload::{self, Payload};
use serde::{Deserialize, Serialize};

/// The kind of change an envelope announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Add,
    Update,
    Delete,
}

/// A change notification as carried on the bus.
///
/// The payload stays an opaque JSON string at this level. Checking its shape is
/// the job of whoever knows which topic the envelope arrived on, see
/// [`Envelope::payload_as`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: Kind,
    #[serde(rename = "data")]
    pub payload: String,
}

impl Envelope {
    /// Builds an envelope by serializing a typed payload into its `data` field.
    pub fn new<P: Payload>(kind: Kind, payload: &P) -> Result<Self, Error> {
        let payload = serde_json::to_string(payload).map_err(Error::encode)?;
        Ok(Self { kind, payload })
    }

    /// Decodes the outer envelope only; the payload is not inspected.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(bytes).map_err(Error::malformed_envelope)
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::encode)
    }

    /// Decodes the payload into the schema of the topic `P` belongs to.
    pub fn payload_as<P: Payload>(&self) -> Result<P, Error> {
        payload::decode(&self.payload).map_err(|e| Error::malformed_payload(P::TOPIC, e))
    }
}
