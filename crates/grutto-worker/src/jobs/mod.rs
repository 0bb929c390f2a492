//! Built-in job handler implementations.

pub mod retention;

use std::sync::Arc;

use grutto_service::DomainServices;

use crate::executor::JobExecutor;

pub use retention::NotificationRetentionJob;

/// An executor with every built-in job registered.
pub fn build_executor(services: &DomainServices) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(NotificationRetentionJob::new(
        services.notifications.clone(),
    )));
    executor
}
