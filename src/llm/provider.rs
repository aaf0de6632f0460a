use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Hosted model provider used for both generation and embeddings.
///
/// Transport failures, timeouts and non-2xx statuses come back as
/// [`ApiError::GenerationUnavailable`]; bodies that decode but carry no text
/// come back as [`ApiError::Malformed`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// provider name (e.g. "gemini", "openai")
    fn name(&self) -> &str;

    /// model used by `embed`; recorded next to ingested vectors
    fn embedding_model(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// one vector per input, in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}
