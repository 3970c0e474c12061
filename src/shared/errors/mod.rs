// Shared errors
pub mod auth_error;
pub mod client_error;
pub mod config_error;
pub mod token_error;

pub use auth_error::*;
pub use client_error::*;
pub use config_error::*;
pub use token_error::*;
