pub mod auth;
pub mod deadline;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use deadline::request_deadline;
pub use response::{ApiResponse, ApiResult};
