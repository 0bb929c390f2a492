//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use grutto_core::config::WorkerConfig;
use grutto_core::error::AppError;

use crate::executor::JobExecutor;
use crate::jobs::NotificationRetentionJob;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Executor the scheduled ticks dispatch into
    executor: Arc<JobExecutor>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler")
            .field("executor", &self.executor)
            .finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(executor: Arc<JobExecutor>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            executor,
        })
    }

    /// Register the built-in schedules from configuration
    pub async fn register_default_tasks(&self, config: &WorkerConfig) -> Result<(), AppError> {
        self.register(
            NotificationRetentionJob::JOB_TYPE,
            &config.retention_sweep_cron,
        )
        .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Run `job_type` on the cron `schedule` (six fields, with seconds)
    pub async fn register(&self, job_type: &str, schedule: &str) -> Result<(), AppError> {
        if !self.executor.has_handler(job_type) {
            return Err(AppError::configuration(format!(
                "No handler registered for scheduled job '{job_type}'"
            )));
        }

        let executor = Arc::clone(&self.executor);
        let name = job_type.to_string();
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let executor = Arc::clone(&executor);
            let name = name.clone();
            Box::pin(async move {
                tracing::debug!(job_type = %name, "Running scheduled job");
                match executor.execute(&name, Utc::now()).await {
                    Ok(summary) => tracing::debug!(job_type = %name, %summary, "Scheduled job done"),
                    Err(e) => tracing::error!(job_type = %name, error = %e, "Scheduled job failed"),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!(
                "Invalid schedule '{schedule}' for {job_type}: {e}"
            ))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add {job_type} schedule: {e}")))?;

        tracing::info!("Registered: {} ({})", job_type, schedule);
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use grutto_core::error::ErrorKind;

    #[tokio::test]
    async fn test_register_requires_handler() {
        let scheduler = CronScheduler::new(Arc::new(JobExecutor::new()))
            .await
            .unwrap();
        let err = scheduler
            .register("notification_retention", "0 0 * * * *")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
