use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde::Serialize;

use super::AppState;
use crate::models::{ChatEvent, ChatRequest};

pub(crate) const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    uptime_secs: u64,
    collection: &'a str,
    model: &'a str,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

pub(crate) async fn root_handler() -> impl IntoResponse {
    Json(RootResponse {
        message: "Document chat API is running",
    })
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        collection: state.engine.index().collection(),
        model: state.engine.model().model_id(),
    })
    .into_response()
}

pub(crate) async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let question = request.question.trim();
    if question.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "question must not be empty");
    }

    match state.engine.ask(question).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chat request failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Streams the turn as newline-delimited JSON records.
pub(crate) async fn chat_stream_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "question must not be empty");
    }

    let lines = state
        .engine
        .ask_stream(question)
        .map(|event| Ok::<_, Infallible>(encode_line(&event)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, NDJSON_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(lines))
        .unwrap_or_else(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn encode_line(event: &ChatEvent) -> String {
    event.to_ndjson().unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to encode chat event");
        "{\"type\":\"error\",\"content\":\"failed to encode event\"}\n".to_string()
    })
}
