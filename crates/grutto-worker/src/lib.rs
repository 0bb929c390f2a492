//! Scheduled maintenance for Grutto Study.
//!
//! This crate provides:
//! - A job executor that dispatches a named job to its handler
//! - A cron scheduler that runs registered jobs periodically
//! - The notification retention sweep

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use jobs::{NotificationRetentionJob, build_executor};
pub use scheduler::CronScheduler;
