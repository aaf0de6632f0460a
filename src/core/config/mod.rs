pub mod defaults;
pub mod paths;
pub mod service;
pub mod settings;
pub mod validation;

use thiserror::Error;

pub use paths::AppPaths;
pub use service::ConfigService;
pub use settings::{
    AppSettings, DatasetSettings, LlmSettings, ProviderKind, RagSettings, ServerSettings,
    SessionSettings,
};

/// Startup configuration failures. Any of these aborts the process before the
/// listener is bound.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{key}` (set it in config.yml/secrets.yaml or via ${env})")]
    Missing {
        key: &'static str,
        env: &'static str,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
