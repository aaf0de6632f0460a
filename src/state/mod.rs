use std::sync::Arc;

use crate::core::config::AppSettings;
use crate::generation::{ArtifactSlot, Orchestrator};
use crate::history::{ConversationSession, TurnRecording};
use crate::llm::{build_provider, LlmProvider};
use crate::rag::ingest::collection_warnings;
use crate::rag::{ExampleStore, IndexedExamples, Retriever, SqliteVectorIndex, VectorIndex};

pub mod error;

use error::InitializationError;

/// Shared state behind every route.
///
/// The example table and the vector collection are read-only here; the
/// conversation session is the only thing a request mutates.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub examples: Arc<ExampleStore>,
    pub index: Arc<dyn VectorIndex>,
    pub retriever: Retriever,
    pub orchestrator: Orchestrator,
    pub session: Arc<ConversationSession>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// 1. Building the LLM provider from settings
    /// 2. Loading the example store
    /// 3. Opening the vector collection and reporting drift against the store
    pub async fn initialize(settings: AppSettings) -> Result<Arc<Self>, InitializationError> {
        let provider = build_provider(&settings.llm).map_err(InitializationError::Llm)?;

        let examples = Arc::new(
            ExampleStore::load(&settings.rag.examples_path)
                .map_err(InitializationError::Examples)?,
        );

        let index: Arc<dyn VectorIndex> = Arc::new(
            SqliteVectorIndex::open(&settings.rag.index_path())
                .await
                .map_err(InitializationError::Index)?,
        );

        match collection_warnings(&examples, provider.embedding_model(), index.as_ref()).await {
            Ok(warnings) => {
                for warning in warnings {
                    tracing::warn!("{}", warning);
                }
            }
            Err(err) => tracing::warn!("Failed to inspect vector collection: {}", err),
        }

        Ok(Self::from_parts(settings, provider, index, examples))
    }

    /// Wires already-built collaborators together.
    pub fn from_parts(
        settings: AppSettings,
        provider: Arc<dyn LlmProvider>,
        index: Arc<dyn VectorIndex>,
        examples: Arc<ExampleStore>,
    ) -> Arc<Self> {
        let repository = IndexedExamples::new(index.clone(), provider.clone(), examples.clone());
        let retriever = Retriever::new(Arc::new(repository));
        let orchestrator = Orchestrator::new(
            provider,
            settings.llm.clone(),
            ArtifactSlot::new(settings.artifact_path.clone()),
        );
        let session = Arc::new(ConversationSession::new(TurnRecording::from_flag(
            settings.session.record_user_turns,
        )));

        Arc::new(AppState {
            settings: Arc::new(settings),
            examples,
            index,
            retriever,
            orchestrator,
            session,
        })
    }
}
