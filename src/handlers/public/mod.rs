// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition, account registration and service status.
pub mod auth;
pub mod system;
