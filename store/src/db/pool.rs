// PostgreSQL connection pool shared by the recipe store repositories

use crate::config::DatabaseConfig;
use crate::errors::DatabaseError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Cheaply cloneable handle to the recipe database.
///
/// Every repository holds a clone; statements run on `pool()` directly, and
/// `RecipeRepository::update` opens its transaction from it.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    /// Connect using the `[database]` settings. At least `min_connections`
    /// connections are opened before this returns.
    ///
    /// # Errors
    /// `DatabaseError::ConnectionFailed` when the server cannot be reached
    /// within `connect_timeout_seconds`
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create database pool");
                DatabaseError::ConnectionFailed(e.to_string())
            })?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool initialized"
        );

        Ok(Self { pool })
    }

    /// Wrap a pool the caller already owns, such as the one the integration
    /// tests create after applying their schema. No connection is checked.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Executor for ad hoc queries and transactions
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip `SELECT 1`, failing with `DatabaseError::HealthCheckFailed`
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database health check failed");
                DatabaseError::HealthCheckFailed(e.to_string())
            })?;

        tracing::debug!("Database health check passed");
        Ok(())
    }

    /// Wait for checked-out connections to return, then close them all
    #[instrument(skip(self))]
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}
