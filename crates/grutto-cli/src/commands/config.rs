//! Configuration inspection commands.

use clap::{Args, Subcommand};

use grutto_core::config::AppConfig;
use grutto_core::error::AppError;
use grutto_database::connection::mask_password;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the merged configuration with secrets masked
    Show,
}

/// Execute config commands
pub fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let masked = masked(config);
            match format {
                OutputFormat::Json => output::print_item(&masked, format),
                OutputFormat::Table => print_summary(&masked),
            }
        }
    }

    Ok(())
}

/// A copy of `config` that is safe to print.
fn masked(config: &AppConfig) -> AppConfig {
    let mut masked = config.clone();
    masked.database.url = mask_password(&config.database.url);
    masked.storage.signed_url.secret = "****".to_string();
    masked
}

fn print_summary(config: &AppConfig) {
    println!("Database");
    output::print_kv("backend", &format!("{:?}", config.database.backend));
    output::print_kv("url", &config.database.url);
    output::print_kv("max connections", &config.database.max_connections.to_string());
    println!("Storage");
    output::print_kv("provider", &format!("{:?}", config.storage.provider));
    output::print_kv("local root", &config.storage.local.root_path);
    output::print_kv("signed url base", &config.storage.signed_url.base_url);
    output::print_kv("signed url ttl", &format!("{}s", config.storage.signed_url.ttl_seconds));
    println!("Upload");
    output::print_kv(
        "max file size",
        &output::human_bytes(config.upload.max_file_size_bytes as i64),
    );
    output::print_kv("allowed types", &config.upload.allowed_mime_types.len().to_string());
    output::print_kv("concurrency", &config.upload.concurrency.to_string());
    println!("Notifications");
    output::print_kv("retention", &format!("{} days", config.notifications.retention_days));
    println!("Sharing");
    output::print_kv("search limit", &config.sharing.user_search_limit.to_string());
    output::print_kv("search min chars", &config.sharing.user_search_min_chars.to_string());
    println!("Worker");
    output::print_kv("enabled", &config.worker.enabled.to_string());
    output::print_kv("retention sweep", &config.worker.retention_sweep_cron);
    println!("Logging");
    output::print_kv("level", &config.logging.level);
    output::print_kv("format", &config.logging.format);
}
