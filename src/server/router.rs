use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers::{chat_handler, chat_stream_handler, health_handler, root_handler};

pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let api = Router::new()
        .route("/api/v1/chat", post(chat_handler))
        .route("/api/v1/chat/stream", post(chat_stream_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
