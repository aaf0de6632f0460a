use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::generation::Intent;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub prompt: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let prompt = payload
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing 'prompt' in request body".to_string()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate", %request_id);

    let code = async {
        let example = state.retriever.retrieve(&prompt).await?;
        state
            .orchestrator
            .generate(&prompt, &example, payload.intent, &state.session)
            .await
    }
    .instrument(span)
    .await?;

    Ok(Json(json!({ "response": code })))
}

pub async fn reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cleared = state.session.reset().await;
    tracing::info!("Conversation session reset ({} turns discarded)", cleared);
    Json(json!({ "response": "History cleared" }))
}
