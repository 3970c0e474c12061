// Shared middleware
pub mod instance;

pub use instance::*;
