//! Load generation tables and batching.

use application::LoadConfig;
use serde::{Deserialize, Serialize};

/// Load generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAppConfig {
    /// Table receiving synthetic users (default: users)
    #[serde(default = "default_users_table")]
    pub users_table: String,

    /// Table receiving large payloads (default: large_data)
    #[serde(default = "default_large_data_table")]
    pub large_data_table: String,

    /// Key/value table touched by held-open transactions
    #[serde(default = "default_meta_table")]
    pub meta_table: String,

    /// Rows per multi-row insert (default: 1000)
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
}

fn default_users_table() -> String {
    "users".to_string()
}

fn default_large_data_table() -> String {
    "large_data".to_string()
}

fn default_meta_table() -> String {
    "_toolkit_meta".to_string()
}

const fn default_batch_size() -> u64 {
    1000
}

impl Default for LoadAppConfig {
    fn default() -> Self {
        Self {
            users_table: default_users_table(),
            large_data_table: default_large_data_table(),
            meta_table: default_meta_table(),
            batch_size: default_batch_size(),
        }
    }
}

impl From<&LoadAppConfig> for LoadConfig {
    fn from(config: &LoadAppConfig) -> Self {
        Self {
            users_table: config.users_table.clone(),
            large_data_table: config.large_data_table.clone(),
            meta_table: config.meta_table.clone(),
            batch_size: config.batch_size,
        }
    }
}
