// Lifecycle domain models
pub mod config;
pub mod sweep;

pub use config::*;
pub use sweep::*;
