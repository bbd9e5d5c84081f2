//! Streaming inserts

mod inserter;
mod sink;

pub use inserter::RowInserter;
pub use sink::insert_sink;
