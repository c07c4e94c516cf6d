pub mod session;

pub use session::logout as session_logout;
pub use session::me as session_me;
