// Tenant store: contract, PostgreSQL adapter, in-memory adapter
pub mod connection;
pub mod memory;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::*;
pub use memory::*;
pub use repositories::*;
pub use store::*;
