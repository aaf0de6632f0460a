use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::core::config::LlmSettings;
use crate::core::errors::ApiError;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &LlmSettings) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            chat_model: strip_models_prefix(&settings.chat_model).to_string(),
            embedding_model: strip_models_prefix(&settings.embedding_model).to_string(),
            client: super::http_client(settings)?,
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_upstream)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::unavailable(format!(
                "Gemini returned {}: {}",
                status,
                text.trim()
            )));
        }

        res.json::<Value>().await.map_err(ApiError::from_upstream)
    }
}

fn strip_models_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

fn build_generate_body(request: &ChatRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .map(|m| {
            json!({
                "role": m.role.as_str(),
                "parts": [{ "text": m.content }],
            })
        })
        .collect();

    let mut generation_config = serde_json::Map::new();
    if let Some(t) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(t));
    }
    if let Some(t) = request.top_p {
        generation_config.insert("topP".to_string(), json!(t));
    }
    if let Some(t) = request.top_k {
        generation_config.insert("topK".to_string(), json!(t));
    }
    if let Some(t) = request.max_output_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(t));
    }
    generation_config.insert("responseMimeType".to_string(), json!("text/plain"));

    let mut body = json!({
        "contents": contents,
        "generationConfig": generation_config,
    });
    if let (Some(obj), Some(instruction)) = (body.as_object_mut(), &request.system_instruction) {
        obj.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": instruction }] }),
        );
    }
    body
}

/// Joins the text parts of the first candidate.
fn extract_candidate_text(payload: &Value) -> Result<String, ApiError> {
    let Some(candidate) = payload["candidates"].as_array().and_then(|c| c.first()) else {
        let reason = payload["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("none");
        return Err(ApiError::malformed(format!(
            "response has no candidates (block reason: {})",
            reason
        )));
    };

    let parts = candidate["content"]["parts"]
        .as_array()
        .ok_or_else(|| ApiError::malformed("candidate has no content parts"))?;

    let texts: Vec<&str> = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if texts.is_empty() {
        return Err(ApiError::malformed("candidate has no text parts"));
    }
    Ok(texts.concat())
}

fn extract_embeddings(payload: &Value, expected: usize) -> Result<Vec<Vec<f32>>, ApiError> {
    let items = payload["embeddings"]
        .as_array()
        .ok_or_else(|| ApiError::malformed("embedding response has no `embeddings` array"))?;

    let embeddings: Vec<Vec<f32>> = items
        .iter()
        .map(|item| {
            item["values"]
                .as_array()
                .map(|vals| {
                    vals.iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    if embeddings.len() != expected || embeddings.iter().any(|e| e.is_empty()) {
        return Err(ApiError::malformed(format!(
            "expected {} embeddings, got {} usable",
            expected,
            embeddings.iter().filter(|e| !e.is_empty()).count()
        )));
    }
    Ok(embeddings)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.chat_model
        );
        let payload = self.post(&url, &build_generate_body(&request)).await?;
        extract_candidate_text(&payload)
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, self.embedding_model
        );
        let model = format!("models/{}", self.embedding_model);
        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": model,
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();

        let payload = self.post(&url, &json!({ "requests": requests })).await?;
        extract_embeddings(&payload, inputs.len())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::extract::Path;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    use super::*;
    use crate::core::config::ProviderKind;
    use crate::llm::types::ChatMessage;

    fn settings(base_url: String, timeout: Duration) -> LlmSettings {
        LlmSettings {
            provider: ProviderKind::Gemini,
            base_url,
            api_key: "test-key".to_string(),
            chat_model: "models/gemini-1.5-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            request_timeout: timeout,
            system_instruction: "You build websites.".to_string(),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    #[test]
    fn generate_body_carries_history_and_config() {
        let request = ChatRequest::new(vec![
            ChatMessage::model("<html>old</html>"),
            ChatMessage::user("make it red"),
        ])
        .with_settings(&settings("http://x".into(), Duration::from_secs(1)));

        let body = build_generate_body(&request);

        assert_eq!(body["contents"][0]["role"], "model");
        assert_eq!(body["contents"][1]["role"], "user");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "make it red");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You build websites."
        );
        assert_eq!(body["generationConfig"]["topK"], 64);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(body["generationConfig"]["responseMimeType"], "text/plain");
    }

    #[test]
    fn candidate_text_joins_parts() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "<html>" }, { "text": "</html>" }] } }]
        });
        assert_eq!(extract_candidate_text(&payload).unwrap(), "<html></html>");
    }

    #[test]
    fn blocked_prompt_is_malformed() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_candidate_text(&payload).unwrap_err();
        assert!(matches!(err, ApiError::Malformed(ref msg) if msg.contains("SAFETY")));
    }

    #[test]
    fn embedding_count_mismatch_is_malformed() {
        let payload = json!({ "embeddings": [{ "values": [0.1, 0.2] }] });
        assert!(extract_embeddings(&payload, 1).is_ok());
        assert!(matches!(
            extract_embeddings(&payload, 2),
            Err(ApiError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn chat_round_trips_through_http() {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(|Path(action): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(action, "gemini-1.5-flash:generateContent");
                assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "test-key");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "candidates": [{ "content": { "role": "model", "parts": [{ "text": format!("echo: {}", prompt) }] } }]
                }))
            }),
        );
        let base = serve(router).await;
        let provider = GeminiProvider::new(&settings(base, Duration::from_secs(5))).unwrap();

        let text = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hello")]))
            .await
            .unwrap();
        assert_eq!(text, "echo: hello");
    }

    #[tokio::test]
    async fn upstream_error_status_is_unavailable() {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(|| async { (axum::http::StatusCode::TOO_MANY_REQUESTS, "quota") }),
        );
        let base = serve(router).await;
        let provider = GeminiProvider::new(&settings(base, Duration::from_secs(5))).unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hello")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::GenerationUnavailable { timed_out: false, .. }
        ));
    }

    #[tokio::test]
    async fn undecodable_success_body_is_malformed() {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(|| async { "<html>gateway splash page</html>" }),
        );
        let base = serve(router).await;
        let provider = GeminiProvider::new(&settings(base, Duration::from_secs(5))).unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hello")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
        assert_eq!(err.status(), axum::http::StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );
        let base = serve(router).await;
        let provider = GeminiProvider::new(&settings(base, Duration::from_millis(200))).unwrap();

        let err = provider
            .chat(ChatRequest::new(vec![ChatMessage::user("hello")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::GenerationUnavailable { timed_out: true, .. }
        ));
    }

    #[tokio::test]
    async fn embed_sends_one_request_per_input() {
        let router = Router::new().route(
            "/v1beta/models/:action",
            post(|Path(action): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(action, "text-embedding-004:batchEmbedContents");
                let requests = body["requests"].as_array().cloned().unwrap_or_default();
                let embeddings: Vec<Value> = requests
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        assert_eq!(r["model"], "models/text-embedding-004");
                        json!({ "values": [i as f64, 1.0] })
                    })
                    .collect();
                Json(json!({ "embeddings": embeddings }))
            }),
        );
        let base = serve(router).await;
        let provider = GeminiProvider::new(&settings(base, Duration::from_secs(5))).unwrap();

        let vectors = provider
            .embed(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 1.0]]);
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }
}
