// Maintenance operations on the recipe schema

use crate::db::statements::reset_id_sequence;
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::telemetry::StatementTimer;
use tracing::instrument;

#[derive(Clone)]
pub struct MaintenanceRepository {
    pool: DbPool,
}

impl MaintenanceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Move `<table>_id_seq` to the largest id in `table`, e.g. after rows were
    /// copied in with explicit ids. Returns the new sequence value, `None` for
    /// an empty table.
    ///
    /// # Errors
    /// `DatabaseError::InvalidIdentifier` when `table` is not a plain lowercase identifier
    #[instrument(skip(self))]
    pub async fn reset_id_sequence(&self, table: &str) -> Result<Option<i64>, DatabaseError> {
        let stmt = reset_id_sequence(table)?;

        let timer = StatementTimer::start("reset_id_sequence");
        let result = sqlx::query_scalar::<_, Option<i64>>(stmt.sql.as_str())
            .fetch_one(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        let value = timer.finish(result)?;
        tracing::info!(table, value, "Id sequence reset");
        Ok(value)
    }
}
