pub mod key_provider;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub use key_provider::{KeyProvider, MasterKey};

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io")]
    Io,
    #[error("codec")]
    Codec,
    #[error("crypto")]
    Crypto,
    #[error("invalid key")]
    Invalid,
}

#[derive(Serialize, Deserialize, Default)]
struct Stored {
    entries: HashMap<String, Vec<u8>>,
}

/// Durable key/value store sealed at rest. One file per namespace; the
/// whole map is re-sealed on every write and swapped in via rename.
pub struct EncryptedStore {
    path: PathBuf,
    namespace: String,
    cipher: ChaCha20Poly1305,
    data: Mutex<Stored>,
}

impl std::fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore")
            .field("path", &self.path)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl EncryptedStore {
    pub fn open(
        path: impl AsRef<Path>,
        namespace: &str,
        key_provider: &dyn KeyProvider,
    ) -> Result<Self, StorageError> {
        if namespace.trim().is_empty() {
            return Err(StorageError::Invalid);
        }
        let mut base = path.as_ref().to_path_buf();
        fs::create_dir_all(&base).map_err(|_| StorageError::Io)?;
        base.push(format!("{}-store.bin", namespace));
        let key = key_provider.get_or_create_master_key()?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        let data = if base.exists() {
            let sealed = fs::read(&base).map_err(|_| StorageError::Io)?;
            Self::unseal(&cipher, &sealed)?
        } else {
            Stored::default()
        };
        Ok(Self {
            path: base,
            namespace: namespace.to_string(),
            cipher,
            data: Mutex::new(data),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let guard = self.data.lock().map_err(|_| StorageError::Io)?;
        Ok(guard.entries.get(key).cloned())
    }

    pub fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut guard = self.data.lock().map_err(|_| StorageError::Io)?;
        guard.entries.insert(key.to_string(), value.to_vec());
        self.persist(&guard)
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.data.lock().map_err(|_| StorageError::Io)?;
        guard.entries.remove(key);
        self.persist(&guard)
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let guard = self.data.lock().map_err(|_| StorageError::Io)?;
        let mut keys: Vec<String> = guard
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn persist(&self, data: &Stored) -> Result<(), StorageError> {
        let plain = serde_json::to_vec(data).map_err(|_| StorageError::Codec)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let sealed = self
            .cipher
            .encrypt(nonce, plain.as_slice())
            .map_err(|_| StorageError::Crypto)?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &out).map_err(|_| StorageError::Io)?;
        fs::rename(&tmp, &self.path).map_err(|_| StorageError::Io)
    }

    fn unseal(cipher: &ChaCha20Poly1305, sealed: &[u8]) -> Result<Stored, StorageError> {
        if sealed.len() <= NONCE_LEN {
            return Err(StorageError::Codec);
        }
        let (nonce_bytes, body) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plain = cipher
            .decrypt(nonce, body)
            .map_err(|_| StorageError::Crypto)?;
        serde_json::from_slice(&plain).map_err(|_| StorageError::Codec)
    }
}

#[cfg(test)]
mod tests;
