//! HTTP surface of the chat relay: health check and the streaming endpoints.

use axum::http::{header, HeaderValue, Method};
use log::*;
use service::AppState;
use tower_http::cors::CorsLayer;

mod controller;
mod extractors;
mod router;
mod sse;

pub use extractors::authenticated_user::{AuthenticatedUser, UserClaim};

/// Header carrying the caller identity resolved upstream.
pub const USER_CLAIM_HEADER: &str = "x-user-claim";

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let server_url = app_state.config.listen_address();
    let shutdown = app_state.shutdown.clone();

    let cors_layer = cors_layer(&app_state.config.allowed_origins);
    let app = router::define_routes(app_state).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("Shutdown requested, draining open connections");
        })
        .await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin \"{origin}\": {e}");
                None
            }
        })
        .collect();
    info!("CORS allowed origins: {allowed_origins:?}");

    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_credentials(true)
        .allow_headers([
            header::ACCEPT,
            header::CACHE_CONTROL,
            header::HeaderName::from_static(USER_CLAIM_HEADER),
        ])
        .allow_origin(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(origins: &[&str]) -> Router {
        let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
        Router::new()
            .route("/health", get(|| async { "ok" }))
            .layer(cors_layer(&origins))
    }

    #[tokio::test]
    async fn allowed_origin_is_echoed() {
        let response = app(&["https://chat.test"])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://chat.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://chat.test"
        );
    }

    #[tokio::test]
    async fn unknown_origin_gets_no_cors_headers() {
        let response = app(&["https://chat.test"])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://evil.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn invalid_origins_are_skipped() {
        let response = app(&["not a header\n", "https://chat.test"])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://chat.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
