// Auth domain models
pub mod auth;
pub mod user;
pub mod jwt;
pub mod renew_token;
pub mod temp_token;

pub use auth::*;
pub use user::*;
pub use jwt::*;
pub use renew_token::*;
pub use temp_token::*;
