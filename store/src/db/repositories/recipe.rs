// Recipe repository: reads, paging, and the multi-stage insert/update statements

use crate::db::statements::{
    insert_recipe, update_recipe, CLEAR_ASSOCIATIONS, COUNT_RECIPES, DELETE_RECIPE, GET_RECIPE,
    GET_RECIPES_PAGE, LOCK_RECIPE,
};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{NewRecipe, Recipe, RecipeSummary};
use crate::telemetry::StatementTimer;
use sqlx::Row;
use tracing::instrument;

/// Repository for recipe-related database operations
#[derive(Clone)]
pub struct RecipeRepository {
    pool: DbPool,
}

impl RecipeRepository {
    /// Create a new RecipeRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Fetch one recipe with its child collections
    ///
    /// # Errors
    /// `DatabaseError::NotFound` when no recipe has this id
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i64) -> Result<Recipe, DatabaseError> {
        let timer = StatementTimer::start("find_recipe");
        let result = async {
            sqlx::query_as::<_, Recipe>(GET_RECIPE.as_str())
                .bind(id)
                .fetch_optional(self.pool.pool())
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("Recipe not found: {}", id)))
        }
        .await;

        timer.finish(result)
    }

    /// Fetch the page of `user_id`'s recipes that follows row number `cursor`.
    ///
    /// Pass 0 for the first page, then the `row_number` of the last row
    /// received. At most `PAGE_SIZE` rows are returned, ascending by id.
    #[instrument(skip(self))]
    pub async fn find_page(
        &self,
        user_id: i64,
        cursor: i64,
    ) -> Result<Vec<RecipeSummary>, DatabaseError> {
        let timer = StatementTimer::start("find_recipes_page");
        let result = sqlx::query_as::<_, RecipeSummary>(GET_RECIPES_PAGE.as_str())
            .bind(user_id)
            .bind(cursor)
            .fetch_all(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        let page = timer.finish(result)?;
        tracing::debug!(user_id, cursor, count = page.len(), "Fetched recipes page");
        Ok(page)
    }

    /// Insert a recipe for `user_id` together with its category, nutrition,
    /// times and name-table links, in one statement.
    ///
    /// # Returns
    /// The id assigned to the new recipe
    #[instrument(skip(self, recipe), fields(recipe_name = %recipe.name))]
    pub async fn create(&self, user_id: i64, recipe: &NewRecipe) -> Result<i64, DatabaseError> {
        let stmt = insert_recipe(user_id, recipe);
        tracing::debug!(params = stmt.param_count(), "Built recipe insert statement");

        let timer = StatementTimer::start("create_recipe");
        let result = async {
            let row = stmt.query().fetch_one(self.pool.pool()).await?;
            let id: i64 = row.try_get("id")?;
            Ok::<_, DatabaseError>(id)
        }
        .await;

        let id = timer.finish(result)?;
        tracing::info!(recipe_id = id, user_id, "Recipe created");
        Ok(id)
    }

    /// Replace a recipe's fields and links.
    ///
    /// Links are fully replaced: existing association rows are deleted, then
    /// the new lists are linked. Both steps share one transaction so a failed
    /// update leaves the old links in place.
    ///
    /// # Errors
    /// `DatabaseError::NotFound` when no recipe has this id
    #[instrument(skip(self, recipe), fields(recipe_name = %recipe.name))]
    pub async fn update(&self, recipe_id: i64, recipe: &NewRecipe) -> Result<(), DatabaseError> {
        let stmt = update_recipe(recipe_id, recipe);
        tracing::debug!(params = stmt.param_count(), "Built recipe update statement");

        let timer = StatementTimer::start("update_recipe");
        let result = async {
            let mut tx = self.pool.pool().begin().await.map_err(|e| {
                DatabaseError::TransactionFailed(format!("Failed to begin transaction: {}", e))
            })?;

            let locked = sqlx::query(LOCK_RECIPE)
                .bind(recipe_id)
                .fetch_optional(&mut *tx)
                .await?;
            if locked.is_none() {
                return Err(DatabaseError::NotFound(format!(
                    "Recipe not found: {}",
                    recipe_id
                )));
            }

            sqlx::query(CLEAR_ASSOCIATIONS)
                .bind(recipe_id)
                .execute(&mut *tx)
                .await?;

            stmt.query().execute(&mut *tx).await?;

            tx.commit().await.map_err(|e| {
                DatabaseError::TransactionFailed(format!("Failed to commit transaction: {}", e))
            })?;
            Ok::<_, DatabaseError>(())
        }
        .await;

        timer.finish(result)?;
        tracing::info!(recipe_id, "Recipe updated");
        Ok(())
    }

    /// Remove every name-table link of a recipe. Lookup rows are kept.
    #[instrument(skip(self))]
    pub async fn clear_associations(&self, recipe_id: i64) -> Result<(), DatabaseError> {
        let timer = StatementTimer::start("clear_associations");
        let result = sqlx::query(CLEAR_ASSOCIATIONS)
            .bind(recipe_id)
            .execute(self.pool.pool())
            .await
            .map(|_| ())
            .map_err(DatabaseError::from);

        timer.finish(result)?;
        tracing::debug!(recipe_id, "Recipe associations cleared");
        Ok(())
    }

    /// Delete a recipe; its satellite and link rows cascade
    ///
    /// # Errors
    /// `DatabaseError::NotFound` when no recipe has this id
    #[instrument(skip(self))]
    pub async fn delete(&self, recipe_id: i64) -> Result<(), DatabaseError> {
        let timer = StatementTimer::start("delete_recipe");
        let result = sqlx::query(DELETE_RECIPE)
            .bind(recipe_id)
            .execute(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        let result = timer.finish(result)?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!(
                "Recipe not found: {}",
                recipe_id
            )));
        }

        tracing::info!(recipe_id, "Recipe deleted");
        Ok(())
    }

    /// Total number of recipes, maintained by the database in `counts`
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let timer = StatementTimer::start("count_recipes");
        let result = sqlx::query_scalar::<_, i64>(COUNT_RECIPES)
            .fetch_one(self.pool.pool())
            .await
            .map_err(DatabaseError::from);

        timer.finish(result)
    }
}
