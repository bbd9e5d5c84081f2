//! Query observation ports and polling schedule

pub mod backoff;
pub mod ports;

pub use backoff::poll_delay;
pub use ports::{NoopObserver, QueryObserver};
