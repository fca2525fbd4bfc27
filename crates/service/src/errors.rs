use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("config file error: {0}")]
    Config(String),
    #[error("delivery error: {0}")]
    Delivery(String),
}

impl ServiceError {
    pub fn storage(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{}: {}", path.display(), err))
    }

    pub fn config(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Config(format!("{}: {}", path.display(), err))
    }
}
