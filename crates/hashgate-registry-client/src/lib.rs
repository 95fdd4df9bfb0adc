mod backoff;
mod client;
mod config;
mod error;
mod jobs;
mod transport;
mod urls;

pub use crate::backoff::Backoff;
pub use crate::client::RegistryClient;
pub use crate::config::RegistryClientConfig;
pub use crate::error::{RegistryError, Result};
pub use crate::jobs::JobTracker;
pub use crate::transport::{
    CredentialsProvider, HttpTransport, RegistryTransport, StaticCredentials, TransportResponse,
};

#[cfg(test)]
mod tests;
