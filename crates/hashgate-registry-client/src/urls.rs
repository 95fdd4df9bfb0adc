use hashgate_types::Fingerprint;

use crate::error::{RegistryError, Result};

pub fn validated_base(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(RegistryError::InvalidBaseUrl);
    }
    if trimmed.len() < 8 {
        return Err(RegistryError::InvalidBaseUrl);
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

pub fn entry(fingerprint: &Fingerprint) -> String {
    format!("/v1/entries/{}", fingerprint.to_hex())
}

pub fn entries() -> String {
    "/v1/entries".to_string()
}

pub fn imports() -> String {
    "/v1/imports".to_string()
}

pub fn import_job(job_id: &str) -> Result<String> {
    let trimmed = job_id.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(RegistryError::InvalidInput("job_id"));
    }
    Ok(format!("/v1/imports/{}", trimmed))
}

pub fn import_job_cancel(job_id: &str) -> Result<String> {
    Ok(format!("{}/cancel", import_job(job_id)?))
}
