use serde::{Deserialize, Serialize};

use crate::core::config::LlmSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}

/// One generation call: prior turns followed by the new user turn, plus the
/// standing role instruction.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system_instruction: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            system_instruction: None,
            messages,
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: None,
        }
    }

    pub fn with_settings(mut self, settings: &LlmSettings) -> Self {
        self.system_instruction = Some(settings.system_instruction.clone());
        self.temperature = Some(settings.temperature);
        self.top_p = Some(settings.top_p);
        self.top_k = Some(settings.top_k);
        self.max_output_tokens = Some(settings.max_output_tokens);
        self
    }
}
