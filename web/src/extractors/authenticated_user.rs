use crate::extractors::RejectionType;
use crate::USER_CLAIM_HEADER;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use log::*;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Caller identity as resolved by the gateway in front of the relay.
///
/// Fields the gateway leaves out are empty.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserClaim {
    #[serde(rename = "userid")]
    pub user_id: String,
    #[serde(rename = "clientid")]
    pub client_id: String,
}

pub struct AuthenticatedUser(pub UserClaim);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    // The claim is trusted as-is; a missing or unreadable header is a client error,
    // not an authentication failure.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(USER_CLAIM_HEADER).ok_or_else(|| {
            debug!("Rejecting request to {}: no user claim", parts.uri.path());
            (
                StatusCode::BAD_REQUEST,
                format!("Missing {USER_CLAIM_HEADER} header"),
            )
        })?;

        let claim = parse_claim(header.as_bytes()).map_err(|e| {
            debug!("Rejecting request to {}: {e}", parts.uri.path());
            (
                StatusCode::BAD_REQUEST,
                format!("Invalid {USER_CLAIM_HEADER} header: {e}"),
            )
        })?;

        Ok(AuthenticatedUser(claim))
    }
}

// Only a JSON object is a claim; arrays would otherwise fill the fields by position.
fn parse_claim(bytes: &[u8]) -> Result<UserClaim, serde_json::Error> {
    let object: Map<String, Value> = serde_json::from_slice(bytes)?;
    UserClaim::deserialize(Value::Object(object))
}
