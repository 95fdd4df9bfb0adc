use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("storage")]
    Storage,
    #[error("validation {0}")]
    Validation(String),
    #[error("registry {0}")]
    Registry(String),
    #[error("transport {0}")]
    Transport(String),
}
