pub mod dto;
pub mod validation;

pub use dto::*;
