//! Background worker CLI commands.

use std::sync::Arc;

use chrono::Utc;
use clap::{Args, Subcommand};

use grutto_core::error::AppError;
use grutto_worker::{CronScheduler, JobExecutionError, build_executor};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for worker commands
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker subcommand
    #[command(subcommand)]
    pub command: WorkerCommand,
}

/// Worker subcommands
#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// Run scheduled jobs until interrupted
    Run,
    /// Run one job immediately
    RunOnce {
        /// Job type
        job_type: String,
    },
    /// List registered job types
    List,
}

/// Execute worker commands
pub async fn execute(args: &WorkerArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let executor = Arc::new(build_executor(&app.services));

    match &args.command {
        WorkerCommand::Run => {
            if !app.config.worker.enabled {
                output::print_warning("Worker is disabled in configuration (worker.enabled)");
                return Ok(());
            }
            let mut scheduler = CronScheduler::new(executor).await?;
            scheduler.register_default_tasks(&app.config.worker).await?;
            scheduler.start().await?;
            output::print_success("Worker started, press Ctrl-C to stop");

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutdown signal received");
            scheduler.shutdown().await?;
            output::print_success("Worker stopped");
        }
        WorkerCommand::RunOnce { job_type } => {
            let result = executor
                .execute(job_type, Utc::now())
                .await
                .map_err(|e| match e {
                    JobExecutionError::Internal(err) => err,
                    other => AppError::internal(other.to_string()),
                })?;
            output::print_item(&result, OutputFormat::Json);
        }
        WorkerCommand::List => {
            let types = executor.registered_types();
            match format {
                OutputFormat::Json => output::print_item(&types, format),
                OutputFormat::Table => {
                    for job_type in &types {
                        output::print_kv("job", job_type);
                    }
                }
            }
        }
    }

    Ok(())
}
