//! HTTP surface for inbound Resend delivery webhooks.
//!
//! Routes:
//! - `POST /webhooks/resend` - apply one delivery event through the
//!   [`DeliveryReducer`]
//! - `GET /health` - liveness probe
//!
//! Every response carries permissive CORS headers and `OPTIONS` on any path
//! answers 200 without reaching a handler.

mod error;
mod handlers;

pub use error::WebhookError;

use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use email_delivery_status::DeliveryReducer;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Header carrying the shared webhook secret.
pub const SECRET_HEADER: &str = "resend-webhook-secret";

const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type, resend-webhook-secret";
const ALLOW_METHODS: &str = "POST, GET, OPTIONS";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub reducer: Arc<DeliveryReducer>,
    /// Expected value of [`SECRET_HEADER`]; `None` disables the check.
    pub webhook_secret: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(reducer: Arc<DeliveryReducer>, webhook_secret: Option<String>) -> Self {
        Self {
            reducer,
            webhook_secret,
            start_time: Instant::now(),
        }
    }
}

/// Build the router with CORS, preflight and tracing layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/resend", post(handlers::resend_webhook))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(middleware::from_fn(preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(TraceLayer::new_for_http())
}

async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return (StatusCode::OK, "ok").into_response();
    }
    next.run(request).await
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Webhook server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Webhook server stopped");
    Ok(())
}
