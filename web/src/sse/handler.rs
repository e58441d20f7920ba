use crate::extractors::authenticated_user::AuthenticatedUser;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use log::*;
use service::AppState;
use sse::message::Scope;
use sse::session;
use std::sync::Arc;

/// Streams every user change to the caller.
pub(crate) async fn subscribe_user(
    AuthenticatedUser(claim): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Response {
    debug!("Opening user stream for {}", claim.user_id);
    stream_response(&app_state, Scope::User)
}

pub(crate) async fn subscribe_contact(
    AuthenticatedUser(claim): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Response {
    debug!("Opening contact stream for {}", claim.user_id);
    stream_response(&app_state, Scope::Contact)
}

pub(crate) async fn subscribe_conversation(
    AuthenticatedUser(claim): AuthenticatedUser,
    State(app_state): State<AppState>,
) -> Response {
    debug!("Opening conversation stream for {}", claim.user_id);
    stream_response(&app_state, Scope::Conversation)
}

/// Streams membership changes of a single conversation.
pub(crate) async fn subscribe_member(
    AuthenticatedUser(claim): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Response {
    debug!(
        "Opening member stream of conversation {conversation_id} for {}",
        claim.user_id
    );
    stream_response(&app_state, Scope::member(conversation_id))
}

// The body owns the session; when the client disconnects hyper drops the body and
// the subscriber is unregistered with it.
fn stream_response(app_state: &AppState, scope: Scope) -> Response {
    session::open(
        Arc::clone(&app_state.sse_manager),
        scope,
        app_state.config.keep_alive(),
        app_state.shutdown.clone(),
    )
    .into_response()
}
