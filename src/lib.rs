//! Account server: credential rotation and account lifecycle management
//! for multiple isolated instances.

pub mod domains;
pub mod routes;
pub mod shared;
