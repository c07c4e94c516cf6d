// handlers/mod.rs - Two-tier handler architecture
//
// Public (no auth) → Protected (JWT auth + active session)
pub mod extract;
pub mod protected; // JWT authentication required (/api/*)
pub mod public; // No authentication required (/, /health, /auth/*, registration)

pub use extract::{ApiJson, ApiPath};
