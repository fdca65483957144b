//! Groq client tests against a mockito server.

use futures::StreamExt;

use tamly::domain::error::{EmbeddingError, GenerationError};
use tamly::domain::models::GenerationConfig;
use tamly::domain::ports::{ChatMessage, EmbeddingClient, GenerationClient};
use tamly::infrastructure::GroqClient;

fn config(base_url: String) -> GenerationConfig {
    GenerationConfig {
        base_url,
        api_key: "test-key".to_string(),
        timeout_secs: 5,
        ..GenerationConfig::default()
    }
}

#[tokio::test]
async fn chat_returns_first_choice_content() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Xin chào"}}]}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let reply = client.chat(&[ChatMessage::user("chào")]).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply, "Xin chào");
}

#[tokio::test]
async fn complete_wraps_prompt_as_user_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"messages":[{"role":"user","content":"prompt text"}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    client.complete("prompt text").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthorized_maps_to_api_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":"invalid key"}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let err = client.complete("hi").await.unwrap_err();
    assert!(matches!(err, GenerationError::Api(_)));
    assert!(err.to_string().contains("authentication"));
}

#[tokio::test]
async fn error_body_never_leaks_api_key() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(400)
        .with_body("bad request for key test-key")
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let err = client.complete("hi").await.unwrap_err();
    assert!(!err.to_string().contains("test-key"));
    assert!(err.to_string().contains("[redacted]"));
}

#[tokio::test]
async fn missing_choices_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let err = client.complete("hi").await.unwrap_err();
    assert!(matches!(err, GenerationError::Malformed(_)));
}

#[tokio::test]
async fn stream_chat_yields_sse_deltas() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"content\":\"Xin \"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"chào\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJsonString(r#"{"stream":true}"#.to_string()))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let stream = client.stream_chat(&[ChatMessage::user("chào")]).await.unwrap();
    let tokens: Vec<String> = stream.map(|r| r.unwrap()).collect().await;

    assert_eq!(tokens, vec!["Xin ", "chào"]);
}

#[tokio::test]
async fn embed_returns_vector() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[{"embedding":[0.1,0.2,0.3]}]}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let embedding = client.embed("trầm cảm").await.unwrap();

    mock.assert_async().await;
    assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn embed_empty_data_is_malformed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;

    let client = GroqClient::new(config(server.url())).unwrap();
    let err = client.embed("text").await.unwrap_err();
    assert!(matches!(err, EmbeddingError::Malformed(_)));
}
