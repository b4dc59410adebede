// User repository: account rows owning recipes

use crate::db::statements::{GET_USER, INSERT_USER};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::User;
use crate::telemetry::StatementTimer;
use tracing::instrument;

/// Repository for user-related database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    ///
    /// # Errors
    /// `DatabaseError::Conflict` when the username or email is already taken
    #[instrument(skip(self, hashed_password))]
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        hashed_password: &str,
    ) -> Result<i64, DatabaseError> {
        let timer = StatementTimer::start("create_user");
        let result = sqlx::query_scalar::<_, i64>(INSERT_USER)
            .bind(username)
            .bind(email)
            .bind(hashed_password)
            .fetch_one(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        let id = match timer.finish(result) {
            Ok(id) => id,
            Err(e) => {
                if e.is_conflict() {
                    tracing::warn!(username, "Username or email already registered");
                }
                return Err(e);
            }
        };

        tracing::info!(user_id = id, username, "User created");
        Ok(id)
    }

    /// Find the user whose username or email matches
    ///
    /// # Errors
    /// `DatabaseError::NotFound` when neither matches
    #[instrument(skip(self))]
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<User, DatabaseError> {
        let timer = StatementTimer::start("find_user");
        let result = async {
            sqlx::query_as::<_, User>(GET_USER)
                .bind(username)
                .bind(email)
                .fetch_optional(self.pool.pool())
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("User not found: {}", username)))
        }
        .await;

        timer.finish(result)
    }
}
