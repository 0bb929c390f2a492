//! Wiring from configuration to services for one CLI invocation.

use tracing::info;

use grutto_core::config::{AppConfig, DatabaseBackend};
use grutto_core::error::AppError;
use grutto_database::{DatabasePool, Repositories};
use grutto_service::{DomainServices, RequestContext};

/// Everything a command needs.
pub struct App {
    /// Loaded configuration.
    pub config: AppConfig,
    /// The pool, when backed by PostgreSQL.
    pub pool: Option<DatabasePool>,
    /// Domain services.
    pub services: DomainServices,
}

impl App {
    /// Connect the configured stores and wire the services.
    pub async fn connect(config: AppConfig) -> Result<Self, AppError> {
        let (pool, repos) = match config.database.backend {
            DatabaseBackend::Postgres => {
                let pool = DatabasePool::connect(&config.database).await?;
                let repos = Repositories::postgres(&pool);
                (Some(pool), repos)
            }
            DatabaseBackend::Memory => {
                info!("Using in-memory row store; nothing persists past this command");
                (None, Repositories::in_memory())
            }
        };
        let blobs = grutto_storage::build_blob_store(&config.storage).await?;
        let services = DomainServices::new(&repos, blobs, &config);

        Ok(Self {
            config,
            pool,
            services,
        })
    }

    /// Resolve the acting user by username.
    pub async fn acting_as(&self, username: Option<&str>) -> Result<RequestContext, AppError> {
        let username = username.ok_or_else(|| {
            AppError::validation("This command needs an acting user, pass --as <username>")
        })?;
        let profile = self.services.profiles.get_by_username(username).await?;
        Ok(RequestContext::new(profile.id, profile.username))
    }

    /// Resolve a list of usernames to profile IDs.
    pub async fn user_ids(&self, usernames: &[String]) -> Result<Vec<uuid::Uuid>, AppError> {
        let mut ids = Vec::with_capacity(usernames.len());
        for name in usernames {
            ids.push(self.services.profiles.get_by_username(name).await?.id);
        }
        Ok(ids)
    }

    /// Close the pool, if any.
    pub async fn close(self) {
        if let Some(pool) = self.pool {
            pool.close().await;
        }
    }
}
