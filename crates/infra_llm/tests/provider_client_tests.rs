//! HTTP contract tests for the provider clients against a mock server

use core_kernel::{PortError, Temperature};
use domain_enrichment::{ChatOptions, EmbeddingPort, LlmPort, LlmRequest};
use infra_llm::{GeminiClient, LlmError, LlmSettings, OllamaClient, OpenAiClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn scoring_request() -> LlmRequest {
    LlmRequest::user(
        "Rate claim 42",
        ChatOptions::with_temperature(Temperature::ZERO).repeat_penalty(1.1),
    )
    .with_system("You are a fraud analyst.")
}

fn summary_request() -> LlmRequest {
    LlmRequest::user(
        "Summarize this insurance claim in 1 sentence: Car hit a deer.",
        ChatOptions::with_temperature(Temperature::new(0.3).unwrap()),
    )
}

// ============================================================================
// Ollama
// ============================================================================

mod ollama_tests {
    use super::*;

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(LlmSettings::new(server.uri(), "llama3.2", "nomic-embed-text", 3)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_sends_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llama3.2",
                "prompt": "Rate claim 42",
                "system": "You are a fraud analyst.",
                "stream": false,
                "options": {"temperature": 0.0, "repeat_penalty": 1.1}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "response": "  SCORE: 10\nANALYSIS: Low.\nRATIONALE: Clean.  ",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server).invoke(scoring_request()).await.unwrap();
        assert_eq!(text, "SCORE: 10\nANALYSIS: Low.\nRATIONALE: Clean.");
    }

    #[tokio::test]
    async fn test_label_names_model() {
        let server = MockServer::start().await;
        assert_eq!(client(&server).label(), "ollama/llama3.2");
    }

    #[tokio::test]
    async fn test_embeddings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_partial_json(json!({"model": "nomic-embed-text", "prompt": "Car hit a deer."})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": [0.1, 0.2, 0.3]})))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.dimensions(), 3);
        assert_eq!(client.embed("Car hit a deer.").await.unwrap(), vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model loading"))
            .mount(&server)
            .await;

        let error = client(&server).invoke(summary_request()).await.unwrap_err();
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn test_blank_completion_is_returned_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "", "done": true})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).invoke(scoring_request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_empty_embedding_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": []})))
            .mount(&server)
            .await;

        let error = client(&server).embed("Car hit a deer").await.unwrap_err();
        assert!(matches!(error, PortError::Transformation { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_connection_error() {
        let client =
            OllamaClient::new(LlmSettings::new("http://127.0.0.1:9", "llama3.2", "nomic-embed-text", 3))
                .unwrap();
        let error = client.invoke(summary_request()).await.unwrap_err();
        assert!(matches!(error, PortError::Connection { .. }));
    }
}

// ============================================================================
// OpenAI
// ============================================================================

mod openai_tests {
    use super::*;

    fn settings(server: &MockServer) -> LlmSettings {
        LlmSettings::new(server.uri(), "gpt-4o-mini", "text-embedding-3-small", 2)
    }

    #[test]
    fn test_missing_key_rejected() {
        let settings = LlmSettings::new("http://localhost", "gpt-4o-mini", "text-embedding-3-small", 2);
        assert!(matches!(OpenAiClient::new(settings), Err(LlmError::Config(_))));
    }

    #[tokio::test]
    async fn test_chat_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "You are a fraud analyst."},
                    {"role": "user", "content": "Rate claim 42"}
                ],
                "temperature": 0.0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "SCORE: 5"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server).with_api_key("sk-test")).unwrap();
        assert_eq!(client.invoke(scoring_request()).await.unwrap(), "SCORE: 5");
    }

    #[tokio::test]
    async fn test_user_only_message_without_system_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "Summarize this insurance claim in 1 sentence: Car hit a deer."}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "A car struck a deer."}}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server).with_api_key("sk-test")).unwrap();
        assert_eq!(client.invoke(summary_request()).await.unwrap(), "A car struck a deer.");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server).with_api_key("sk-bad")).unwrap();
        assert!(matches!(
            client.invoke(summary_request()).await,
            Err(PortError::Unauthorized { .. })
        ));
        assert!(matches!(
            client.embed("text").await,
            Err(PortError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_embeddings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(json!({"model": "text-embedding-3-small", "input": "hail"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [0.5, -0.5]}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(settings(&server).with_api_key("sk-test")).unwrap();
        assert_eq!(client.embed("hail").await.unwrap(), vec![0.5, -0.5]);
    }
}

// ============================================================================
// Gemini
// ============================================================================

mod gemini_tests {
    use super::*;

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(
            LlmSettings::new(server.uri(), "gemini-1.5-flash", "text-embedding-004", 2).with_api_key("g-key"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Rate claim 42"}]}],
                "systemInstruction": {"parts": [{"text": "You are a fraud analyst."}]},
                "generationConfig": {"temperature": 0.0}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "SCORE: 7\n"}, {"text": "ANALYSIS: ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            client(&server).invoke(scoring_request()).await.unwrap(),
            "SCORE: 7\nANALYSIS: ok"
        );
    }

    #[tokio::test]
    async fn test_no_candidates_is_blank_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).invoke(summary_request()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_embed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/text-embedding-004:embedContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(json!({
                "model": "models/text-embedding-004",
                "content": {"parts": [{"text": "flood"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": {"values": [1.0, 0.0]}})))
            .mount(&server)
            .await;

        assert_eq!(client(&server).embed("flood").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        assert!(client(&server).invoke(summary_request()).await.unwrap_err().is_not_found());
    }
}
