//! Job executor: dispatches a named job to its registered handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing;

use grutto_core::error::AppError;

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The name the job is registered and scheduled under
    fn job_type(&self) -> &str;

    /// Run the job as of `now`, returning a summary
    async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, do not retry
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, the next scheduled run may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Classify a service error by whether a later run could succeed.
    pub fn from_app_error(context: &str, err: AppError) -> Self {
        if err.kind.is_transient() {
            Self::Transient(format!("{context}: {err}"))
        } else {
            Self::Internal(err)
        }
    }
}

/// Dispatches jobs to the appropriate handler by job type
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!("Registered job handler for type '{}'", job_type);
        self.handlers.insert(job_type, handler);
    }

    /// Run one job by type
    pub async fn execute(
        &self,
        job_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!("No handler registered for job type '{job_type}'"))
        })?;

        tracing::info!(job_type, "Executing job");
        handler.execute(now).await
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Registered job types, sorted
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl JobHandler for Echo {
        fn job_type(&self) -> &str {
            "echo"
        }

        async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
            Ok(serde_json::json!({ "at": now.timestamp() }))
        }
    }

    #[tokio::test]
    async fn test_dispatch_by_type() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(Echo));
        assert!(executor.has_handler("echo"));
        assert_eq!(executor.registered_types(), ["echo"]);

        let now = Utc::now();
        let out = executor.execute("echo", now).await.unwrap();
        assert_eq!(out["at"], now.timestamp());
    }

    #[tokio::test]
    async fn test_unknown_job_is_permanent() {
        let executor = JobExecutor::new();
        let err = executor.execute("missing", Utc::now()).await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
    }

    #[test]
    fn test_transient_classification() {
        let err = JobExecutionError::from_app_error("sweep", AppError::database("timeout"));
        assert!(matches!(err, JobExecutionError::Transient(_)));
        let err = JobExecutionError::from_app_error("sweep", AppError::validation("bad"));
        assert!(matches!(err, JobExecutionError::Internal(_)));
    }
}
