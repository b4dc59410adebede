// Recipe store: data-access layer for recipes and their normalized child tables

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod telemetry;

pub use db::repositories::{
    CategoryRepository, MaintenanceRepository, RecipeRepository, UserRepository,
};
pub use db::DbPool;
pub use errors::{DatabaseError, ErrorKind};
