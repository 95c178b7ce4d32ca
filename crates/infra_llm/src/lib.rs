//! LLM Provider Clients
//!
//! HTTP adapters for the three supported AI backends. Each client implements
//! both [`LlmPort`](domain_enrichment::LlmPort) (text generation) and
//! [`EmbeddingPort`](domain_enrichment::EmbeddingPort) (vectors for the
//! pgvector index).
//!
//! | Provider | Generation | Embeddings |
//! |----------|------------|------------|
//! | Ollama | `POST {endpoint}/api/generate` | `POST {endpoint}/api/embeddings` |
//! | OpenAI | `POST {endpoint}/chat/completions` | `POST {endpoint}/embeddings` |
//! | Gemini | `POST {endpoint}/v1beta/models/{model}:generateContent` | `...:embedContent` |
//!
//! Request timeouts are configured per client; failures surface as
//! [`LlmError`] and convert into `PortError` at the port boundary.

pub mod error;
pub mod gemini;
pub mod http;
pub mod ollama;
pub mod openai;

pub use error::LlmError;
pub use gemini::GeminiClient;
pub use http::LlmSettings;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
