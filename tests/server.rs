mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::{FailingIndex, Script, ScriptedModel, add_document, memory_index};
use docchat::client::NdjsonDecoder;
use docchat::error::AppError;
use docchat::models::{ChatAnswer, ChatEvent, ServerConfig};
use docchat::server::{AppState, ChatServer, build_router};
use docchat::services::ChatEngine;

fn limit() -> usize {
    ServerConfig::default().max_body_size
}

async fn engine_with_docs(script: Script) -> ChatEngine {
    let index = memory_index();
    add_document(&*index, "/docs/rust.pdf", "rust ownership and borrowing").await;
    ChatEngine::new(index, ScriptedModel::new(script))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

#[tokio::test]
async fn test_root_reports_liveness() {
    let engine = engine_with_docs(Script::Fragments(vec!["ok"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["message"].as_str().is_some());
}

#[tokio::test]
async fn test_health_names_collection_and_model() {
    let engine = engine_with_docs(Script::Fragments(vec!["ok"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["collection"], "test_collection");
    assert_eq!(json["model"], "scripted-test");
}

#[tokio::test]
async fn test_chat_returns_answer_and_sources() {
    let engine = engine_with_docs(Script::Fragments(vec!["Borrow", "ing"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat", r#"{"question":"what is rust borrowing?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let answer: ChatAnswer = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(answer.answer, "Borrowing");
    assert_eq!(answer.sources, vec!["rust.pdf".to_string()]);
}

#[tokio::test]
async fn test_chat_failure_is_500_with_detail() {
    let engine = ChatEngine::new(Arc::new(FailingIndex), ScriptedModel::answering(vec!["x"]));
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat", r#"{"question":"rust?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(json["detail"].as_str().unwrap().contains("store offline"));
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let engine = engine_with_docs(Script::Fragments(vec!["x"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat", r#"{"question":"   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_missing_question_field_is_rejected() {
    let engine = engine_with_docs(Script::Fragments(vec!["x"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat", r#"{"query":"rust?"}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_stream_is_ndjson_with_sources_last() {
    let engine = engine_with_docs(Script::Fragments(vec!["Hel", "lo", " world"])).await;
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat/stream", r#"{"question":"rust borrowing"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/x-ndjson"
    );

    let body = body_bytes(response).await;
    let text = String::from_utf8(body.clone()).unwrap();
    assert_eq!(text.lines().count(), 4);

    let mut decoder = NdjsonDecoder::default();
    let events = decoder.feed(&body).unwrap();
    assert_eq!(
        events,
        vec![
            ChatEvent::Answer("Hel".to_string()),
            ChatEvent::Answer("lo".to_string()),
            ChatEvent::Answer(" world".to_string()),
            ChatEvent::Sources(vec!["rust.pdf".to_string()]),
        ]
    );
    assert_eq!(decoder.finish().unwrap(), None);
}

#[tokio::test]
async fn test_stream_failure_is_single_error_record() {
    let engine = ChatEngine::new(Arc::new(FailingIndex), ScriptedModel::answering(vec!["x"]));
    let app = build_router(AppState::new(engine), limit());

    let response = app
        .oneshot(post_json("/api/v1/chat/stream", r#"{"question":"rust?"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let json: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(json["type"], "error");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let engine = engine_with_docs(Script::Fragments(vec!["x"])).await;
    let app = build_router(AppState::new(engine), 64);

    let question = "a".repeat(500);
    let response = app
        .oneshot(post_json(
            "/api/v1/chat",
            &format!(r#"{{"question":"{question}"}}"#),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_server_takes_body_limit_from_config() {
    let engine = engine_with_docs(Script::Fragments(vec!["ok"])).await;
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8123,
        max_body_size: 1024,
    };

    let server = ChatServer::new(&config, engine).unwrap();
    assert_eq!(server.addr().to_string(), "127.0.0.1:8123");
    assert_eq!(server.max_body_size(), 1024);
}

#[tokio::test]
async fn test_server_rejects_unparseable_host() {
    let engine = engine_with_docs(Script::Fragments(vec!["ok"])).await;
    let config = ServerConfig {
        host: "not a host".to_string(),
        ..ServerConfig::default()
    };

    assert!(matches!(
        ChatServer::new(&config, engine),
        Err(AppError::Startup(_))
    ));
}
