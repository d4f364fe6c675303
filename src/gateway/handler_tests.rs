use std::sync::Arc;

use axum::{Router, body::Body, http::Request, http::StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use super::*;
use crate::backend::{Embedder, Generator, MockEmbedder, MockGenerator, MockRetriever, Retriever};
use crate::engine::{EngineConfig, QueryEngine, QuerySource};
use crate::gateway::payload::{AskResponse, BatchResponse};

const GOOD_ANSWER: &str = "1. 재료: 김치, 돼지고기\n\n2. 조리 방법: 김치를 볶기\n\n3. 팁: 간은 마지막에";

fn test_state(generator: MockGenerator) -> HandlerState {
    let engine = QueryEngine::new(
        EngineConfig::default().gate(4, f64::INFINITY),
        Arc::new(MockRetriever::from_contents(&["김치찌개 레시피 재료"])) as Arc<dyn Retriever>,
        Arc::new(MockEmbedder::default()) as Arc<dyn Embedder>,
        Arc::new(generator) as Arc<dyn Generator>,
    );
    HandlerState::new(Arc::new(engine), "template")
}

fn test_router() -> (Router, HandlerState) {
    let state = test_state(MockGenerator::with_answer(GOOD_ANSWER));
    (create_router(state.clone()), state)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn header(response: &axum::response::Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (router, _) = test_router();

    let response = router.oneshot(get("/healthz")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, DALGURAK_STATUS_HEADER), "healthy");
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_follows_gate() {
    let (router, state) = test_router();

    let response = router.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["components"]["gate"], "ready");
    assert_eq!(body["components"]["generator"], "template");

    state.engine.gate().close();
    let response = router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(header(&response, DALGURAK_STATUS_HEADER), "closed");
}

#[tokio::test]
async fn test_ask_direct_then_cache() {
    let (router, _) = test_router();
    let request = r#"{"question": "김치찌개 레시피"}"#;

    let response = router.clone().oneshot(post_json("/v1/ask", request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, DALGURAK_SOURCE_HEADER), "direct");
    let first: AskResponse = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(first.source, QuerySource::Direct);
    assert_eq!(first.answer, GOOD_ANSWER);
    assert!(first.error.is_none());

    let response = router.oneshot(post_json("/v1/ask", request)).await.unwrap();
    assert_eq!(header(&response, DALGURAK_SOURCE_HEADER), "cache");
    let body = body_json(response).await;
    assert_eq!(body["source"], "cache");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_ask_empty_question_is_ok() {
    let (router, _) = test_router();

    let response = router
        .oneshot(post_json("/v1/ask", r#"{"question": "   "}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["source"], "empty");
}

#[tokio::test]
async fn test_ask_backend_failure_is_ok_with_error() {
    let generator = MockGenerator::with_answer(GOOD_ANSWER);
    generator.fail_on("김치찌개 레시피");
    let router = create_router(test_state(generator));

    let response = router
        .oneshot(post_json("/v1/ask", r#"{"question": "김치찌개 레시피"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, DALGURAK_SOURCE_HEADER), "error");
    let body = body_json(response).await;
    assert_eq!(body["source"], "error");
    assert!(body["error"].as_str().unwrap().contains("mock generator refused"));
    assert_eq!(body["quality"]["completeness"], 0.0);
}

#[tokio::test]
async fn test_ask_malformed_json_is_bad_request() {
    let (router, _) = test_router();

    for body in ["not json", r#"{"query": "missing field"}"#] {
        let response = router.clone().oneshot(post_json("/v1/ask", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(header(&response, DALGURAK_STATUS_HEADER), "invalid_request");
        let json = body_json(response).await;
        assert_eq!(json["code"], 400);
    }
}

#[tokio::test]
async fn test_batch_keeps_order() {
    let (router, _) = test_router();
    let request = r#"{"questions": ["김치찌개 레시피", "", "된장찌개 레시피"]}"#;

    let response = router.oneshot(post_json("/v1/ask/batch", request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: BatchResponse = serde_json::from_value(body_json(response).await).unwrap();
    let sources: Vec<QuerySource> = body.results.iter().map(|r| r.source).collect();
    assert_eq!(
        sources,
        vec![QuerySource::Direct, QuerySource::Empty, QuerySource::Direct]
    );
}

#[tokio::test]
async fn test_batch_over_limit_is_rejected() {
    let (router, state) = test_router();
    let questions: Vec<String> = (0..=crate::constants::MAX_BATCH_SIZE)
        .map(|i| format!("질문 {i}"))
        .collect();
    let request = serde_json::json!({ "questions": questions }).to_string();

    let response = router.oneshot(post_json("/v1/ask/batch", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(header(&response, DALGURAK_STATUS_HEADER), "batch_too_large");
    assert_eq!(state.engine.performance_stats().total_requests, 0);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (router, _) = test_router();

    router
        .clone()
        .oneshot(post_json("/v1/ask", r#"{"question": "김치찌개 레시피"}"#))
        .await
        .unwrap();

    let response = router.oneshot(get("/v1/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["performance"]["total_requests"], 1);
    assert_eq!(body["answer_cache"]["valid_entries"], 1);
    assert_eq!(body["gate"]["admitted"], 1);
    assert_eq!(body["gate"]["max_concurrent"], 4);
}
