use serde::{Deserialize, Serialize};

use crate::fingerprint::Fingerprint;

/// Wire shape of a registry row. `created_at` is an ISO-8601 string and
/// `expires_at` is epoch seconds consumed by the registry's own TTL
/// eviction; clients stamp both on store and never read `expires_at`
/// back for local decisions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    pub fingerprint: Fingerprint,
    pub created_at: String,
    pub expires_at: u64,
}
