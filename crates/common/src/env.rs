//! Environment/runtime helpers
//!
//! Sanity checks to ensure the directories holding runtime files exist at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Create the parent directory of `file` if it is missing.
pub async fn ensure_parent_dir(file: &Path) -> anyhow::Result<()> {
    let Some(dir) = file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", dir.display()))?;
    debug!(dir = %dir.display(), "data directory ready");
    Ok(())
}

/// Warn when an optional input file is absent.
pub async fn warn_if_missing(file: &Path, what: &str) {
    if tokio::fs::metadata(file).await.is_err() {
        warn!(path = %file.display(), "{what} not found");
    }
}
