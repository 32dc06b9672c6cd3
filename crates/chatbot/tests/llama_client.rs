use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use bookstore_chatbot::{ChatbotConfig, ChatbotError, Completion, LlamaClient, Prompt};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base: String) -> LlamaClient {
    LlamaClient::new(&ChatbotConfig {
        llama_base_url: base,
        timeout_secs: 2,
        fallback_timeout_secs: 2,
        ..ChatbotConfig::default()
    })
    .unwrap()
}

fn prompt() -> Prompt {
    Prompt {
        system: "system".to_string(),
        user: "user".to_string(),
    }
}

#[tokio::test]
async fn chat_completions_answer_first() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["model"], "local");
            assert_eq!(body["messages"][1]["content"], "user");
            Json(json!({"choices": [{"message": {"content": "{\"answer\":\"hi\"}"}}]}))
        }),
    );
    let base = serve(router).await;

    let text = client(base).complete(&prompt()).await.unwrap();
    assert_eq!(text, "{\"answer\":\"hi\"}");
}

#[tokio::test]
async fn falls_through_to_llama_completion() {
    let hits = Arc::new(AtomicUsize::new(0));
    let chat_hits = hits.clone();
    let router = Router::new()
        .route(
            "/v1/chat/completions",
            post(move || {
                chat_hits.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::NOT_FOUND }
            }),
        )
        .route(
            "/v1/completions",
            post(|| async { Json(json!({"choices": [{"text": ""}]})) }),
        )
        .route(
            "/completion",
            post(|Json(body): Json<Value>| async move {
                assert!(body["prompt"].as_str().unwrap().ends_with("\n\nASSISTANT:"));
                Json(json!({"content": "llama says hi"}))
            }),
        );
    let base = serve(router).await;

    let text = client(base).complete(&prompt()).await.unwrap();
    assert_eq!(text, "llama says hi");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_endpoint_failing_is_unavailable() {
    let router = Router::new().fallback(|| async { StatusCode::INTERNAL_SERVER_ERROR });
    let base = serve(router).await;

    let err = client(base).complete(&prompt()).await.unwrap_err();
    assert_eq!(err, ChatbotError::Unavailable);
}
