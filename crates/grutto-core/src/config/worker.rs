//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Periodic maintenance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether scheduled maintenance runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the notification retention sweep.
    #[serde(default = "default_retention_cron")]
    pub retention_sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            retention_sweep_cron: default_retention_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_retention_cron() -> String {
    "0 0 * * * *".to_string()
}
