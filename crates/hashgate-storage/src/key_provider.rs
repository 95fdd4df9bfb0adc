use crate::StorageError;

#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; 32],
}

impl MasterKey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

/// Supplies the store key. Key issuance and escrow are the embedding
/// application's concern; the store only consumes the current key.
pub trait KeyProvider: Send + Sync {
    fn get_or_create_master_key(&self) -> Result<MasterKey, StorageError>;
    fn get_master_key(&self) -> Result<MasterKey, StorageError>;
}
