use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    pub storage_path: String,
    pub namespace: String,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            storage_path: ".hashgate".to_string(),
            namespace: "default".to_string(),
        }
    }
}
