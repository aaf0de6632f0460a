use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::{ChatRequest, ChatRole};
use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;

/// Any server speaking the OpenAI chat/embeddings dialect (LM Studio,
/// llama.cpp server, vLLM, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            chat_model: settings.chat_model.clone(),
            embedding_model: settings.embedding_model.clone(),
            client: super::http_client(settings)?,
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::unavailable(format!(
                "chat endpoint returned {}: {}",
                status,
                text.trim()
            )));
        }

        res.json::<Value>().await.map_err(ApiError::from_upstream)
    }
}

fn build_chat_body(request: &ChatRequest, model: &str) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(instruction) = &request.system_instruction {
        messages.push(json!({ "role": "system", "content": instruction }));
    }
    for message in &request.messages {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "assistant",
        };
        messages.push(json!({ "role": role, "content": message.content }));
    }

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature {
            obj.insert("temperature".to_string(), json!(t));
        }
        if let Some(t) = request.top_p {
            obj.insert("top_p".to_string(), json!(t));
        }
        if let Some(t) = request.max_output_tokens {
            obj.insert("max_tokens".to_string(), json!(t));
        }
    }
    body
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let payload = self
            .post(&url, &build_chat_body(&request, &self.chat_model))
            .await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ApiError::malformed("response has no choices[0].message.content"))
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
        });
        let payload = self.post(&url, &body).await?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| ApiError::malformed("embedding response has no `data` array"))?;

        let mut indexed: Vec<(usize, Vec<f32>)> = data
            .iter()
            .enumerate()
            .filter_map(|(pos, item)| {
                let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
                item["embedding"].as_array().map(|vals| {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    (index, vec)
                })
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);

        if indexed.len() != inputs.len() {
            return Err(ApiError::malformed(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                indexed.len()
            )));
        }
        Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;

    #[test]
    fn chat_body_maps_model_turns_to_assistant() {
        let mut request = ChatRequest::new(vec![
            ChatMessage::model("<html></html>"),
            ChatMessage::user("add a footer"),
        ]);
        request.system_instruction = Some("You build websites.".to_string());
        request.max_output_tokens = Some(256);

        let body = build_chat_body(&request, "local-model");

        assert_eq!(body["model"], "local-model");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["messages"][2]["role"], "user");
        assert_eq!(body["messages"][2]["content"], "add a footer");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn sampling_fields_are_only_sent_when_set() {
        let mut request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        let body = build_chat_body(&request, "local-model");
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());
        assert!(body.get("max_tokens").is_none());

        request.temperature = Some(0.5);
        request.top_p = Some(0.9);
        let body = build_chat_body(&request, "local-model");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["top_p"], 0.9);
    }
}
