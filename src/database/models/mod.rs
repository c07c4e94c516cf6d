pub mod project;
pub mod task;
pub mod todo_list;
pub mod user;

pub use project::Project;
pub use task::Task;
pub use todo_list::TodoList;
pub use user::User;
