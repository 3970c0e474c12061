// Lifecycle domain services
pub mod scheduler;
pub mod sweeps;

pub use scheduler::*;
pub use sweeps::*;
