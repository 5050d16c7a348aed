//! Routing and State

use std::sync::Arc;

use axum::{
    http::{header, Method, Request, StatusCode},
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    fetch::ImageSource,
    primitive::tracing::{self, instrument},
    thumb::serve_thumbnail,
};

/// Application State, shared read-only by every request.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Limits and drawing options
    pub config: Arc<Config>,
    /// Where source images come from
    pub source: Arc<dyn ImageSource>,
}

/// Only let GET through. Runs before the query is even looked at, so a
/// wrong method wins over bad parameters.
#[instrument(skip_all, fields(method = %request.method()))]
async fn get_only<B>(request: Request<B>, next: Next<B>) -> Response {
    if request.method() != Method::GET {
        tracing::warn!("method not allowed");
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET")],
            "This service serves GET only",
        )
            .into_response();
    }
    next.run(request).await
}

/// Build the service.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/thumbnail", any(serve_thumbnail))
        .route_layer(from_fn(get_only))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
