//! Notification retention configuration.

use serde::{Deserialize, Serialize};

/// Notification retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notifications older than this many days are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

fn default_retention_days() -> i64 {
    30
}
