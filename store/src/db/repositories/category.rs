// Category repository

use crate::db::statements::GET_CATEGORIES;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::telemetry::StatementTimer;
use tracing::instrument;

/// Read access to the shared category lookup table
#[derive(Clone)]
pub struct CategoryRepository {
    pool: DbPool,
}

impl CategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All category names, alphabetically
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<String>, DatabaseError> {
        let timer = StatementTimer::start("list_categories");
        let result = sqlx::query_scalar::<_, String>(GET_CATEGORIES)
            .fetch_all(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        let categories = timer.finish(result)?;
        tracing::debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }
}
