// Repositories executing the recipe store statements

pub mod category;
pub mod maintenance;
pub mod recipe;
pub mod user;

pub use category::CategoryRepository;
pub use maintenance::MaintenanceRepository;
pub use recipe::RecipeRepository;
pub use user::UserRepository;
