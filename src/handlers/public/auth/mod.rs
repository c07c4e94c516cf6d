// handlers/public/auth/mod.rs - Public authentication handlers
//
// Both endpoints hand out a bearer token bound to a fresh login session.
pub mod login; // POST /auth/login
pub mod register; // POST /api/users/register

pub use login::login_post;
pub use register::register_post;
