use hop_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("no free short code found after {attempts} attempts")]
    ExhaustedRetries { attempts: usize },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
