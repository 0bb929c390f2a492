//! Recipient search configuration.

use serde::{Deserialize, Serialize};

/// Settings for the share recipient picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharingConfig {
    /// Maximum number of profiles returned by a username search.
    #[serde(default = "default_search_limit")]
    pub user_search_limit: i64,
    /// Queries shorter than this return no results.
    #[serde(default = "default_min_chars")]
    pub user_search_min_chars: usize,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            user_search_limit: default_search_limit(),
            user_search_min_chars: default_min_chars(),
        }
    }
}

fn default_search_limit() -> i64 {
    10
}

fn default_min_chars() -> usize {
    2
}
