//! Request admission and execution

pub mod executor;
pub mod gate;

pub use executor::RetryingExecutor;
pub use gate::RequestGate;
