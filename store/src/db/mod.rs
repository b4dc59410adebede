// Database layer: connection pool, statement builder, repositories

pub mod pool;
pub mod repositories;
pub mod statements;

pub use pool::DbPool;
pub use statements::{SqlArg, Statement};
