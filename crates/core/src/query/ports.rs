//! Port interface for observing query progress
//!
//! Observers receive metadata about a running query. Rows never travel
//! through this channel; they are returned from the query itself.

use bqstream_domain::{Job, QueryEvent, Table, TableReference};
use tokio::sync::mpsc::UnboundedSender;

/// Trait for receiving query side-channel notifications.
///
/// Every method defaults to a no-op, so implementors override only what
/// they care about. Calls happen inline on the polling task and must not
/// block.
pub trait QueryObserver: Send + Sync {
    /// A job id was assigned.
    fn on_job_id(&self, _job_id: &str) {}

    /// Final job metadata, emitted once the job reaches DONE.
    fn on_job(&self, _job: &Job) {}

    /// The destination table identity is known.
    fn on_destination(&self, _table: &TableReference) {}

    /// Destination table metadata was fetched.
    fn on_table(&self, _table: &Table) {}

    /// No more rows will be produced.
    fn on_exhausted(&self) {}
}

/// Observer that discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl QueryObserver for NoopObserver {}

// A closed receiver is not an error for the query; events are dropped.
impl QueryObserver for UnboundedSender<QueryEvent> {
    fn on_job_id(&self, job_id: &str) {
        let _ = self.send(QueryEvent::JobId(job_id.to_string()));
    }

    fn on_job(&self, job: &Job) {
        let _ = self.send(QueryEvent::Job(Box::new(job.clone())));
    }

    fn on_destination(&self, table: &TableReference) {
        let _ = self.send(QueryEvent::Destination(table.clone()));
    }

    fn on_table(&self, table: &Table) {
        let _ = self.send(QueryEvent::Table(Box::new(table.clone())));
    }

    fn on_exhausted(&self) {
        let _ = self.send(QueryEvent::Done);
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn channel_observer_forwards_events_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reference = TableReference::new("p", "d", "t");

        tx.on_job_id("job_1");
        tx.on_destination(&reference);
        tx.on_exhausted();

        assert_eq!(rx.try_recv().unwrap(), QueryEvent::JobId("job_1".into()));
        assert_eq!(rx.try_recv().unwrap(), QueryEvent::Destination(reference));
        assert_eq!(rx.try_recv().unwrap(), QueryEvent::Done);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel::<QueryEvent>();
        drop(rx);
        tx.on_exhausted();
    }
}
