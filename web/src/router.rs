use crate::controller::health_check_controller;
use crate::sse::handler;
use axum::{routing::get, Router};
use service::AppState;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(subscribe_routes(app_state))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn subscribe_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/user/subscribe", get(handler::subscribe_user))
        .route("/user/subscribe/contact", get(handler::subscribe_contact))
        .route(
            "/user/subscribe/conversation",
            get(handler::subscribe_conversation),
        )
        .route(
            "/user/subscribe/conversation/{conversation}/member",
            get(handler::subscribe_member),
        )
        .with_state(app_state)
}
