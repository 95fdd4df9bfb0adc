use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Closed taxonomy for registry calls. Only `Connectivity`, `Throttled`
/// and `ServerFault` are retryable; `Conflict` is remapped to success by
/// the store path and never reaches callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connectivity")]
    Connectivity,
    #[error("throttled")]
    Throttled,
    #[error("server fault")]
    ServerFault,
    #[error("bad request")]
    BadRequest,
    #[error("unauthorized")]
    Unauthorized,
    #[error("conflict")]
    Conflict,
    #[error("invalid base url")]
    InvalidBaseUrl,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

impl RegistryError {
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::Connectivity | RegistryError::Throttled | RegistryError::ServerFault
        )
    }

    /// Stable label used in logs and in adapters that flatten the
    /// taxonomy into a string.
    pub fn kind_label(&self) -> &'static str {
        match self {
            RegistryError::Connectivity => "connectivity",
            RegistryError::Throttled => "throttled",
            RegistryError::ServerFault => "server_fault",
            RegistryError::BadRequest => "bad_request",
            RegistryError::Unauthorized => "unauthorized",
            RegistryError::Conflict => "conflict",
            RegistryError::InvalidBaseUrl => "invalid_base_url",
            RegistryError::InvalidInput(_) => "invalid_input",
        }
    }
}

/// The single mapping from a non-success transport status to an error
/// kind. Semantic statuses (404 on lookup/delete, 409 on store) are
/// interpreted by the operation before this mapping applies.
pub fn map_status(status: u16) -> RegistryError {
    match status {
        401 | 403 => RegistryError::Unauthorized,
        409 => RegistryError::Conflict,
        429 => RegistryError::Throttled,
        400..=499 => RegistryError::BadRequest,
        _ => RegistryError::ServerFault,
    }
}
