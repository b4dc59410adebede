// SQL statements for the recipe store
//
// Fixed statements are plain strings. Insert and update are assembled per call
// because the name-table stages depend on which child lists carry data.

pub mod delete;
pub mod insert;
pub mod name_tables;
pub mod select;
pub mod update;

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

pub use delete::{CLEAR_ASSOCIATIONS, DELETE_RECIPE};
pub use insert::{insert_recipe, INSERT_USER};
pub use name_tables::{NameTableBuilder, RecipeRef};
pub use select::{
    reset_id_sequence, COUNT_RECIPES, GET_CATEGORIES, GET_RECIPE, GET_RECIPES_PAGE, GET_USER,
    LOCK_RECIPE, PAGE_SIZE,
};
pub use update::update_recipe;

/// First placeholder available to the name-table stages; `$1`..`$18` are fixed
pub const FIRST_NAME_PARAM: usize = 19;

/// A positional argument, bound in order as `$1`, `$2`, ...
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    BigInt(i64),
    SmallInt(i16),
    Text(String),
    Uuid(Uuid),
}

impl From<&str> for SqlArg {
    fn from(value: &str) -> Self {
        SqlArg::Text(value.to_string())
    }
}

impl From<&String> for SqlArg {
    fn from(value: &String) -> Self {
        SqlArg::Text(value.clone())
    }
}

impl From<i64> for SqlArg {
    fn from(value: i64) -> Self {
        SqlArg::BigInt(value)
    }
}

impl From<i16> for SqlArg {
    fn from(value: i16) -> Self {
        SqlArg::SmallInt(value)
    }
}

impl From<Uuid> for SqlArg {
    fn from(value: Uuid) -> Self {
        SqlArg::Uuid(value)
    }
}

/// SQL text together with the arguments for its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<SqlArg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// Highest placeholder index the arguments cover
    pub fn param_count(&self) -> usize {
        self.args.len()
    }

    /// Bind every argument in order onto a query ready for execution
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.args
            .iter()
            .fold(sqlx::query(&self.sql), |query, arg| match arg {
                SqlArg::BigInt(v) => query.bind(*v),
                SqlArg::SmallInt(v) => query.bind(*v),
                SqlArg::Text(v) => query.bind(v.as_str()),
                SqlArg::Uuid(v) => query.bind(*v),
            })
    }
}
