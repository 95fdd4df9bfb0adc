pub mod store_tests;

use crate::key_provider::{KeyProvider, MasterKey};
use crate::StorageError;
use uuid::Uuid;

#[derive(Clone)]
pub struct TestKeyProvider {
    pub key: [u8; 32],
}

impl TestKeyProvider {
    pub fn new(byte: u8) -> Self {
        Self { key: [byte; 32] }
    }
}

impl KeyProvider for TestKeyProvider {
    fn get_or_create_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new(self.key))
    }

    fn get_master_key(&self) -> Result<MasterKey, StorageError> {
        Ok(MasterKey::new(self.key))
    }
}

pub fn temp_path(label: &str) -> String {
    format!("/tmp/{}-{}", label, Uuid::new_v4())
}
