pub mod manager;
pub mod models;
pub mod patch;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Project, Task, TodoList, User};
pub use patch::Patch;
