//! SQLite database handle for the SolarLink cloud.

use std::path::Path;

use solarlink_core::db::{self, DatabaseError};
use sqlx::{Pool, Sqlite};
use tracing::info;

#[derive(Clone)]
pub struct CloudDatabase {
    pool: Pool<Sqlite>,
}

impl CloudDatabase {
    pub async fn open(path: &Path) -> Result<Self, DatabaseError> {
        let pool = db::open_pool(path).await?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub async fn open_in_memory() -> Result<Self, DatabaseError> {
        let pool = db::open_pool_in_memory().await?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        info!("Cloud database migrations complete");
        Ok(())
    }

    /// Liveness probe for the excluded API layer's health endpoint.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}
