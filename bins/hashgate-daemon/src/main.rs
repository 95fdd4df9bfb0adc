mod clients;
mod config;

use clients::registry_remote::RemoteRegistry;
use config::HashgateConfig;
use hashgate_core::config::GateConfig;
use hashgate_core::messaging::MockTransport;
use hashgate_core::registry::{FingerprintRegistry, InMemoryFingerprintRegistry};
use hashgate_core::ContentGate;
use hashgate_registry_client::{
    HttpTransport, RegistryClient, RegistryClientConfig, StaticCredentials,
};
use hashgate_storage::{KeyProvider, MasterKey, StorageError};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct DaemonKey;

impl KeyProvider for DaemonKey {
    fn get_or_create_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new([2u8; 32]))
    }

    fn get_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new([2u8; 32]))
    }
}

#[derive(thiserror::Error, Debug)]
enum DaemonError {
    #[error("config")]
    Config,
    #[error("client")]
    Client,
    #[error("core")]
    Core,
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    let args: Vec<String> = std::env::args().collect();
    let mut path = PathBuf::from("hashgate.toml");
    let mut i = 1;
    while i + 1 < args.len() {
        if args[i] == "--config" {
            path = PathBuf::from(&args[i + 1]);
        }
        i += 1;
    }
    let cfg = config::load_config(&path).map_err(|_| DaemonError::Config)?;
    init_logging(&cfg);
    let gate = init_gate(&cfg).await?;
    let runner = gate.start_retry_runner();
    log::info!("hashgate daemon running");
    let _ = signal::ctrl_c().await;
    runner.stop().await;
    Ok(())
}

fn init_logging(cfg: &HashgateConfig) {
    let level = match cfg.logging.level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

async fn init_gate(cfg: &HashgateConfig) -> Result<ContentGate, DaemonError> {
    let storage_path = cfg.data_dir.join("gate");
    let gate_cfg = GateConfig {
        storage_path: storage_path.to_str().unwrap_or(".hashgate").to_string(),
        namespace: cfg.namespace.clone(),
    };
    let registry: Arc<dyn FingerprintRegistry> = if cfg.registry.enabled {
        Arc::new(build_remote_registry(cfg)?)
    } else {
        Arc::new(InMemoryFingerprintRegistry::new())
    };
    // the real outgoing pipeline attaches through the MessageTransport
    // seam; nothing in this binary sends messages itself
    let transport = Arc::new(MockTransport::new());
    ContentGate::init(
        gate_cfg,
        cfg.policy.clone(),
        Arc::new(DaemonKey),
        registry,
        transport,
    )
    .await
    .map_err(|_| DaemonError::Core)
}

fn build_remote_registry(cfg: &HashgateConfig) -> Result<RemoteRegistry, DaemonError> {
    let client_cfg = RegistryClientConfig {
        timeout_ms: cfg.registry.timeout_ms,
        connect_timeout_ms: cfg.registry.connect_timeout_ms,
        retry_max_attempts: cfg.registry.retry_max_attempts,
        retry_initial_delay_ms: cfg.registry.retry_initial_delay_ms,
        retry_max_delay_ms: cfg.registry.retry_max_delay_ms,
        entry_ttl_secs: cfg.registry.entry_ttl_secs,
        ..RegistryClientConfig::default()
    };
    let credentials = Arc::new(StaticCredentials::new(
        cfg.registry.api_token.clone().unwrap_or_default(),
    ));
    let transport = HttpTransport::new(cfg.registry.base_url.clone(), &client_cfg, credentials)
        .map_err(|_| DaemonError::Client)?;
    let client = RegistryClient::new(Arc::new(transport), client_cfg)
        .map_err(|_| DaemonError::Client)?;
    Ok(RemoteRegistry::new(client))
}
