//! Query execution

mod job;
mod options;

pub use job::{Page, QueryJob, QueryState};
pub use options::QueryOptions;
