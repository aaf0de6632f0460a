//! Generation Orchestrator: prompt + retrieved example -> cleaned code.

pub mod artifact;
pub mod cleanup;
pub mod prompt;

use std::sync::Arc;

pub use artifact::ArtifactSlot;
pub use cleanup::strip_html_fence;
pub use prompt::{compose_instruction, Intent};

use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;
use crate::history::ConversationSession;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
    artifact: ArtifactSlot,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings, artifact: ArtifactSlot) -> Self {
        Self {
            provider,
            settings,
            artifact,
        }
    }

    /// Sends the composed instruction with the full session history, cleans
    /// the reply and records it in `session`.
    ///
    /// Other generation calls wait for this one to finish. On any error
    /// nothing is appended.
    pub async fn generate(
        &self,
        prompt: &str,
        retrieved_example: &str,
        intent: Option<Intent>,
        session: &ConversationSession,
    ) -> Result<String, ApiError> {
        let instruction = compose_instruction(prompt, retrieved_example, intent);

        let turn = session.begin().await;
        let mut messages = Vec::with_capacity(turn.history().len() + 1);
        messages.extend_from_slice(turn.history());
        messages.push(ChatMessage::user(instruction.as_str()));
        let history_len = turn.history().len();

        let request = ChatRequest::new(messages).with_settings(&self.settings);
        let raw = self.provider.chat(request).await.inspect_err(|err| {
            tracing::warn!(provider = self.provider.name(), "Generation failed: {}", err);
        })?;

        let code = strip_html_fence(&raw);
        self.artifact.store(&code).await;
        if !turn.commit(&instruction, &code).await {
            tracing::info!("Session was reset during generation; reply not recorded");
        }

        tracing::info!(
            intent = ?intent,
            history_turns = history_len,
            response_chars = code.len(),
            "Generated response"
        );
        Ok(code)
    }
}
