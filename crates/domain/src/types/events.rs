//! Side-channel notifications emitted while a query runs

use super::job::Job;
use super::table::{Table, TableReference};

/// Observational events; none of them carry result rows.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryEvent {
    /// A job id was assigned (submitted or supplied by the caller)
    JobId(String),
    /// Final job metadata is available
    Job(Box<Job>),
    /// The destination table identity is known
    Destination(TableReference),
    /// Destination table metadata (schema, row count) is available
    Table(Box<Table>),
    /// The result stream is exhausted
    Done,
}
