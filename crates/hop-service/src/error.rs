use hop_core::StorageError;
use hop_generator::GeneratorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LinkError>;

#[derive(Debug, Clone, Error)]
pub enum LinkError {
    #[error("alias already exists: {0}")]
    AliasConflict(String),
    #[error("no free short code found after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },
    #[error("link not found: {0}")]
    NotFound(String),
    #[error("caller does not own link: {0}")]
    Forbidden(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid alias: {0}")]
    InvalidAlias(String),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<GeneratorError> for LinkError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::ExhaustedRetries { attempts } => Self::ExhaustedRetries { attempts },
            GeneratorError::Storage(e) => Self::Storage(e),
        }
    }
}
