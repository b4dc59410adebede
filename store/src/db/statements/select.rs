// Read statements: single recipe, recipe pages, counts, users, categories

use lazy_static::lazy_static;
use regex::Regex;

use super::Statement;
use crate::errors::DatabaseError;
use crate::models::NameTable;

/// Maximum number of recipes returned per page
pub const PAGE_SIZE: i64 = 12;

/// Joins shared by every denormalized recipe read; `r` is the recipe row
const RECIPE_JOINS: &str = r#"FROM recipes r
        JOIN category_recipe cr ON cr.recipe_id = r.id
        JOIN categories c ON c.id = cr.category_id
        JOIN nutrition n ON n.recipe_id = r.id
        JOIN time_recipe tr2 ON tr2.recipe_id = r.id
        JOIN times t2 ON t2.id = tr2.time_id"#;

/// Child names of one table as an array, correlated on `r.id`.
/// Element order is unspecified: the link tables carry no position column.
fn child_array(table: NameTable) -> String {
    format!(
        r#"ARRAY(
            SELECT x.name
            FROM {table} x
            JOIN {assoc} xa ON xa.{entity}_id = x.id
            WHERE xa.recipe_id = r.id
        ) AS {table}"#,
        table = table.table(),
        assoc = table.assoc_table(),
        entity = table.entity(),
    )
}

/// Column list of a denormalized recipe row
fn recipe_columns() -> String {
    let arrays = NameTable::ALL
        .iter()
        .map(|table| child_array(*table))
        .collect::<Vec<_>>()
        .join(",\n        ");

    format!(
        r#"r.id AS recipe_id,
        r.name AS recipe_name,
        r.description,
        r.url,
        r.image,
        r.yield,
        r.created_at,
        r.updated_at,
        c.name AS category,
        n.calories,
        n.total_carbohydrates,
        n.sugars,
        n.protein,
        n.total_fat,
        n.saturated_fat,
        n.cholesterol,
        n.sodium,
        n.fiber,
        {arrays},
        t2.prep::text AS time_prep,
        t2.cook::text AS time_cook,
        t2.total::text AS time_total"#,
        arrays = arrays,
    )
}

lazy_static! {
    /// One recipe by id (`$1`)
    pub static ref GET_RECIPE: String = format!(
        r#"
        SELECT
        {columns}
        {joins}
        WHERE r.id = $1"#,
        columns = recipe_columns(),
        joins = RECIPE_JOINS,
    );

    /// Page of an owner's (`$1`) recipes numbered by ascending id, after row number `$2`
    pub static ref GET_RECIPES_PAGE: String = format!(
        r#"
        WITH numbered AS (
            SELECT
            ROW_NUMBER() OVER (ORDER BY r.id) AS row_number,
            {columns}
            {joins}
            JOIN user_recipe ur ON ur.recipe_id = r.id
            WHERE ur.user_id = $1
        )
        SELECT *
        FROM numbered
        WHERE row_number > $2
        ORDER BY recipe_id ASC
        LIMIT {limit}"#,
        columns = recipe_columns(),
        joins = RECIPE_JOINS,
        limit = PAGE_SIZE,
    );

    static ref IDENTIFIER: Regex = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$")
        .expect("identifier pattern is valid");
}

/// Row-level lock used to check existence before replacing a recipe's links
pub const LOCK_RECIPE: &str = "SELECT id FROM recipes WHERE id = $1 FOR UPDATE";

pub const COUNT_RECIPES: &str = r#"
    SELECT recipes
    FROM counts
    WHERE id = 1"#;

pub const GET_USER: &str = r#"
    SELECT id, username, email, hashed_password
    FROM users
    WHERE username = $1 OR email = $2"#;

pub const GET_CATEGORIES: &str = r#"
    SELECT name
    FROM categories
    ORDER BY name"#;

/// Realign `<table>_id_seq` with the largest id stored in `table`
pub fn reset_id_sequence(table: &str) -> Result<Statement, DatabaseError> {
    if !IDENTIFIER.is_match(table) {
        return Err(DatabaseError::InvalidIdentifier(table.to_string()));
    }

    Ok(Statement::new(
        format!("SELECT setval('{table}_id_seq', MAX(id)) FROM {table}"),
        Vec::new(),
    ))
}
