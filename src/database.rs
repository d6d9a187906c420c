//! database (db) connection handling.
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Postgres;
use crate::error::StoreError;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "accounts";
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Shared database handle.
#[derive(Clone)]
pub struct Database {
    pub postgres: PgPool,
}

impl Database {
    /// Init database connections.
    pub async fn new(
        hostname: &str,
        username: &str,
        password: &str,
        db: &str,
        pool: u32,
    ) -> Result<Self, StoreError> {
        let addr = format!("postgres://{username}:{password}@{hostname}/{db}");
        let database = Self::connect(&addr, pool).await?;

        tracing::info!(%hostname, %db, "postgres connected");

        Ok(database)
    }

    /// Init database connections from the `postgres` configuration entry.
    pub async fn from_config(config: &Postgres) -> Result<Self, StoreError> {
        Self::new(
            &config.address,
            config.username.as_deref().unwrap_or(DEFAULT_CREDENTIALS),
            config.password.as_deref().unwrap_or(DEFAULT_CREDENTIALS),
            config.database.as_deref().unwrap_or(DEFAULT_DATABASE_NAME),
            config.pool_size.unwrap_or(DEFAULT_POOL_SIZE),
        )
        .await
    }

    /// Init database connections from a full connection URL.
    pub async fn connect(url: &str, pool: u32) -> Result<Self, StoreError> {
        let postgres =
            PgPoolOptions::new().max_connections(pool).connect(url).await?;

        Ok(Self { postgres })
    }

    /// Execute migrations scripts.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.postgres).await?;
        tracing::debug!("migrations applied");

        Ok(())
    }
}
