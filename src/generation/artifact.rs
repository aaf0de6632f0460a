use std::path::{Path, PathBuf};

/// Single on-disk slot holding the latest generated artifact. Each write
/// replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSlot {
    path: Option<PathBuf>,
}

impl ArtifactSlot {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Failures are logged; the request that produced the artifact still succeeds.
    pub async fn store(&self, contents: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        if let Err(err) = tokio::fs::write(path, contents).await {
            tracing::warn!("Failed to write artifact to {}: {}", path.display(), err);
        }
    }
}
