use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RegistryClientConfig;
use crate::error::{RegistryError, Result};
use crate::urls;

#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// HTTP-like request boundary to the remote registry. Implementations
/// surface IO-level failures (no response reached the registry, timeout
/// included) as `Connectivity`; non-success statuses are returned as-is
/// for the operation to interpret.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn get(&self, path: &str) -> Result<TransportResponse>;
    async fn post(&self, path: &str, body: Value) -> Result<TransportResponse>;
    async fn delete(&self, path: &str) -> Result<TransportResponse>;
}

/// "Current credentials, or fail with unauthorized." Issuance and
/// refresh live with the identity collaborator, never here.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn bearer_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(RegistryError::Unauthorized);
        }
        Ok(self.token.clone())
    }
}

pub struct HttpTransport {
    base_url: String,
    http: reqwest::Client,
    credentials: Arc<dyn CredentialsProvider>,
    max_response_bytes: usize,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        cfg: &RegistryClientConfig,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<HttpTransport> {
        if cfg.timeout_ms == 0 {
            return Err(RegistryError::InvalidInput("timeout_ms"));
        }
        if cfg.connect_timeout_ms == 0 {
            return Err(RegistryError::InvalidInput("connect_timeout_ms"));
        }
        if cfg.max_response_bytes == 0 {
            return Err(RegistryError::InvalidInput("max_response_bytes"));
        }
        if cfg.user_agent.trim().is_empty() {
            return Err(RegistryError::InvalidInput("user_agent"));
        }
        let base_raw: String = base_url.into();
        let base = urls::validated_base(base_raw.as_str())?;
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .build()
            .map_err(|_| RegistryError::Connectivity)?;
        Ok(HttpTransport {
            base_url: base,
            http,
            credentials,
            max_response_bytes: cfg.max_response_bytes,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<TransportResponse> {
        let token = self.credentials.bearer_token().await?;
        let resp = builder
            .bearer_auth(token)
            .send()
            .await
            .map_err(|_| RegistryError::Connectivity)?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|_| RegistryError::Connectivity)?;
        if body.len() > self.max_response_bytes {
            return Err(RegistryError::ServerFault);
        }
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    async fn get(&self, path: &str) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, path);
        self.execute(self.http.get(url)).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, path);
        self.execute(self.http.post(url).json(&body)).await
    }

    async fn delete(&self, path: &str) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, path);
        self.execute(self.http.delete(url)).await
    }
}
