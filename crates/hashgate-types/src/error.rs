use thiserror::Error;

pub type Result<T> = std::result::Result<T, HashgateTypesError>;

#[derive(Debug, Error)]
pub enum HashgateTypesError {
    #[error("invalid fingerprint hex")]
    InvalidFingerprintHex,
    #[error("invalid job status {0}")]
    InvalidJobStatus(String),
}
