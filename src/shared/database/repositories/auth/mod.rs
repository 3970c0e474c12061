// Auth repositories
pub mod user_repository;
pub mod renew_token_repository;
pub mod temp_token_repository;
pub mod instance_repository;

pub use user_repository::*;
pub use renew_token_repository::*;
pub use temp_token_repository::*;
pub use instance_repository::*;
