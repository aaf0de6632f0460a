//! Typed view over the merged YAML/env config.
//!
//! `AppSettings::resolve` is the single place where required keys are
//! enforced; a missing credential or storage path surfaces here as
//! [`ConfigError::Missing`] before anything else starts.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::defaults::*;
use super::paths::AppPaths;
use super::validation::validate_config;
use super::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub api_key: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
    pub system_instruction: String,
}

// Hand-written so the credential never lands in a log line.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &"****")
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub storage_path: PathBuf,
    pub collection: String,
    pub examples_path: PathBuf,
    pub ingest_batch_size: usize,
}

impl RagSettings {
    /// SQLite file backing the vector collection.
    pub fn index_path(&self) -> PathBuf {
        self.storage_path.join(format!("{}.db", self.collection))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSettings {
    pub record_user_turns: bool,
}

#[derive(Debug, Clone)]
pub struct DatasetSettings {
    pub source_url: String,
    pub offset: u64,
    pub length: u32,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub session: SessionSettings,
    /// `None` disables the artifact slot.
    pub artifact_path: Option<PathBuf>,
    pub dataset: DatasetSettings,
}

impl AppSettings {
    pub fn resolve(config: &Value, paths: &AppPaths) -> Result<Self, ConfigError> {
        validate_config(config)?;

        let server = section(config, "server");
        let llm = section(config, "llm");
        let rag = section(config, "rag");
        let session = section(config, "session");
        let output = section(config, "output");
        let dataset = section(config, "dataset");

        let provider = match str_field(llm, "provider") {
            Some("openai") => ProviderKind::OpenAi,
            _ => ProviderKind::Gemini,
        };
        let default_base_url = match provider {
            ProviderKind::Gemini => DEFAULT_GEMINI_BASE_URL,
            ProviderKind::OpenAi => DEFAULT_OPENAI_BASE_URL,
        };

        let api_key = str_field(llm, "api_key").ok_or(ConfigError::Missing {
            key: "llm.api_key",
            env: "GEMINI_API_KEY",
        })?;
        let storage_path = str_field(rag, "storage_path").ok_or(ConfigError::Missing {
            key: "rag.storage_path",
            env: "STORAGE_PATH",
        })?;

        let cors_allowed_origins = server
            .and_then(|s| s.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(default_local_origins);

        let artifact_path = match output.and_then(|o| o.get("artifact_path")) {
            Some(Value::String(path)) if path.trim().is_empty() => None,
            Some(Value::String(path)) => Some(paths.resolve(path)),
            _ => Some(paths.user_data_dir.join(DEFAULT_ARTIFACT_FILE)),
        };

        Ok(AppSettings {
            server: ServerSettings {
                host: str_field(server, "host").unwrap_or(DEFAULT_HOST).to_string(),
                port: u64_field(server, "port")
                    .map(|p| p as u16)
                    .unwrap_or(DEFAULT_PORT),
                cors_allowed_origins,
            },
            llm: LlmSettings {
                provider,
                base_url: str_field(llm, "base_url")
                    .unwrap_or(default_base_url)
                    .trim_end_matches('/')
                    .to_string(),
                api_key: api_key.to_string(),
                chat_model: str_field(llm, "chat_model")
                    .unwrap_or(DEFAULT_CHAT_MODEL)
                    .to_string(),
                embedding_model: str_field(llm, "embedding_model")
                    .unwrap_or(DEFAULT_EMBEDDING_MODEL)
                    .to_string(),
                temperature: f64_field(llm, "temperature").unwrap_or(DEFAULT_TEMPERATURE),
                top_p: f64_field(llm, "top_p").unwrap_or(DEFAULT_TOP_P),
                top_k: u64_field(llm, "top_k")
                    .map(|v| v as u32)
                    .unwrap_or(DEFAULT_TOP_K),
                max_output_tokens: u64_field(llm, "max_output_tokens")
                    .map(|v| v as u32)
                    .unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
                request_timeout: Duration::from_secs(
                    u64_field(llm, "request_timeout_secs").unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
                ),
                system_instruction: str_field(llm, "system_instruction")
                    .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
                    .to_string(),
            },
            rag: RagSettings {
                storage_path: paths.resolve(storage_path),
                collection: str_field(rag, "collection")
                    .unwrap_or(DEFAULT_COLLECTION)
                    .to_string(),
                examples_path: paths.resolve(
                    str_field(rag, "examples_path").unwrap_or(DEFAULT_EXAMPLES_PATH),
                ),
                ingest_batch_size: u64_field(rag, "ingest_batch_size")
                    .map(|v| v as usize)
                    .unwrap_or(DEFAULT_INGEST_BATCH_SIZE),
            },
            session: SessionSettings {
                record_user_turns: session
                    .and_then(|s| s.get("record_user_turns"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            },
            artifact_path,
            dataset: DatasetSettings::from_section(dataset),
        })
    }
}

impl DatasetSettings {
    /// Reads only the `dataset` section. Data preparation runs before any
    /// credential or store exists, so it does not go through `AppSettings`.
    pub fn from_config(config: &Value) -> Self {
        Self::from_section(section(config, "dataset"))
    }

    fn from_section(dataset: Option<&Value>) -> Self {
        DatasetSettings {
            source_url: str_field(dataset, "source_url")
                .unwrap_or(DEFAULT_DATASET_URL)
                .to_string(),
            offset: u64_field(dataset, "offset").unwrap_or(0),
            length: u64_field(dataset, "length")
                .map(|v| v as u32)
                .unwrap_or(DEFAULT_DATASET_LENGTH),
        }
    }
}

fn section<'a>(config: &'a Value, key: &str) -> Option<&'a Value> {
    config.get(key).filter(|v| v.is_object())
}

fn str_field<'a>(section: Option<&'a Value>, key: &str) -> Option<&'a str> {
    section
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn u64_field(section: Option<&Value>, key: &str) -> Option<u64> {
    section.and_then(|s| s.get(key)).and_then(|v| v.as_u64())
}

fn f64_field(section: Option<&Value>, key: &str) -> Option<f64> {
    section.and_then(|s| s.get(key)).and_then(|v| v.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths() -> (tempfile::TempDir, AppPaths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::with_dirs(tmp.path().to_path_buf(), tmp.path().join("data"));
        (tmp, paths)
    }

    #[test]
    fn missing_credential_is_reported_with_env_hint() {
        let (_tmp, paths) = paths();
        let err = AppSettings::resolve(&json!({ "rag": { "storage_path": "store" } }), &paths)
            .unwrap_err();
        match err {
            ConfigError::Missing { key, env } => {
                assert_eq!(key, "llm.api_key");
                assert_eq!(env, "GEMINI_API_KEY");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_storage_path_is_reported() {
        let (_tmp, paths) = paths();
        let err = AppSettings::resolve(&json!({ "llm": { "api_key": "k" } }), &paths)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "rag.storage_path",
                ..
            }
        ));
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let (_tmp, paths) = paths();
        let err = AppSettings::resolve(
            &json!({ "llm": { "api_key": "  " }, "rag": { "storage_path": "s" } }),
            &paths,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let (tmp, paths) = paths();
        let settings = AppSettings::resolve(
            &json!({ "llm": { "api_key": "k" }, "rag": { "storage_path": "store" } }),
            &paths,
        )
        .unwrap();

        assert_eq!(settings.server.port, DEFAULT_PORT);
        assert_eq!(settings.llm.provider, ProviderKind::Gemini);
        assert_eq!(settings.llm.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(settings.llm.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.llm.top_k, 64);
        assert_eq!(settings.rag.storage_path, tmp.path().join("store"));
        assert_eq!(settings.rag.index_path(), tmp.path().join("store").join("embeds.db"));
        assert_eq!(settings.rag.examples_path, tmp.path().join("data.csv"));
        assert!(!settings.session.record_user_turns);
        assert_eq!(
            settings.artifact_path,
            Some(tmp.path().join("data").join("output.html"))
        );
        assert!(!format!("{:?}", settings.llm).contains("\"k\""));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let (_tmp, paths) = paths();
        let settings = AppSettings::resolve(
            &json!({
                "server": { "port": 0, "cors_allowed_origins": ["*"] },
                "llm": {
                    "provider": "openai",
                    "api_key": "k",
                    "base_url": "http://localhost:9999/",
                    "request_timeout_secs": 5
                },
                "rag": { "storage_path": "/abs/store", "collection": "sites" },
                "session": { "record_user_turns": true },
                "output": { "artifact_path": "" }
            }),
            &paths,
        )
        .unwrap();

        assert_eq!(settings.server.port, 0);
        assert_eq!(settings.server.cors_allowed_origins, vec!["*".to_string()]);
        assert_eq!(settings.llm.provider, ProviderKind::OpenAi);
        assert_eq!(settings.llm.base_url, "http://localhost:9999");
        assert_eq!(settings.llm.request_timeout, Duration::from_secs(5));
        assert_eq!(settings.rag.index_path(), PathBuf::from("/abs/store/sites.db"));
        assert!(settings.session.record_user_turns);
        assert!(settings.artifact_path.is_none());
    }

    #[test]
    fn dataset_settings_do_not_need_credentials() {
        let dataset = DatasetSettings::from_config(&json!({ "dataset": { "offset": 200 } }));
        assert_eq!(dataset.offset, 200);
        assert_eq!(dataset.length, DEFAULT_DATASET_LENGTH);
        assert_eq!(dataset.source_url, DEFAULT_DATASET_URL);
    }
}
