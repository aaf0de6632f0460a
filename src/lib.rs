pub mod core;
pub mod generation;
pub mod history;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use crate::core::config::{AppPaths, ConfigService};

/// Process bootstrap shared by the server and the offline tools: `.env`
/// files, path discovery and the global subscriber.
pub fn bootstrap(log_file: &str) -> ConfigService {
    if let Ok(cwd) = std::env::current_dir() {
        load_env_files(&cwd);
    }

    let paths = Arc::new(AppPaths::new());
    crate::core::logging::init(&paths, log_file);
    ConfigService::new(paths)
}

/// Loads `.env` then `.env.local` from `dir`. Neither overrides a variable
/// that is already set, so the process environment wins, then `.env`.
fn load_env_files(dir: &Path) {
    for name in [".env", ".env.local"] {
        let path = dir.join(name);
        if path.exists() {
            if let Err(err) = dotenv::from_path(&path) {
                eprintln!("Failed to load {}: {}", path.display(), err);
            }
        }
    }
}
