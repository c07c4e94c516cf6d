// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every route here sits behind `jwt_auth_middleware`, which puts the
// caller's `AuthUser` into the request extensions. Authorization against the
// owning project happens in the services.
pub mod auth;
pub mod projects;
pub mod tasks;
pub mod todo_lists;
