use std::{io, path::Path};
use tokio::fs;
use tracing::info;

use crate::errors::ServiceError;

/// Principal ids permitted to talk to the bot when the allow-list is enabled.
///
/// Loaded once at startup and never mutated, so it is shared behind an `Arc`
/// without a lock.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    ids: Vec<i64>,
}

impl AllowList {
    pub fn new(ids: Vec<i64>) -> Self {
        Self { ids }
    }

    /// Read a JSON array of integer ids. A missing file gives an empty list,
    /// which admits nobody; a malformed one is an error.
    pub async fn load(path: &Path) -> Result<Self, ServiceError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "allow-list file not found, nobody is allow-listed");
                return Ok(Self::default());
            }
            Err(e) => return Err(ServiceError::config(path, e)),
        };
        let ids: Vec<i64> = serde_json::from_slice(&bytes).map_err(|e| ServiceError::config(path, e))?;
        info!(count = ids.len(), path = %path.display(), "allow-list loaded");
        Ok(Self { ids })
    }

    pub fn is_allowed(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
