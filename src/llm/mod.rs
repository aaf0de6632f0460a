pub mod gemini;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use openai::OpenAiCompatibleProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest, ChatRole};

use crate::core::config::{LlmSettings, ProviderKind};
use crate::core::errors::ApiError;

pub fn build_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, ApiError> {
    let provider: Arc<dyn LlmProvider> = match settings.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(settings)?),
        ProviderKind::OpenAi => Arc::new(OpenAiCompatibleProvider::new(settings)?),
    };
    tracing::info!(
        provider = provider.name(),
        chat_model = %settings.chat_model,
        embedding_model = %settings.embedding_model,
        "LLM provider configured"
    );
    Ok(provider)
}

pub(crate) fn http_client(settings: &LlmSettings) -> Result<reqwest::Client, ApiError> {
    reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()
        .map_err(ApiError::internal)
}
