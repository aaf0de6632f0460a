use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::errors::ApiError;
use crate::rag::ExampleStoreError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to load example store: {0}")]
    Examples(#[source] ExampleStoreError),

    #[error("Failed to open vector store: {0}")]
    Index(#[source] ApiError),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] ApiError),
}
