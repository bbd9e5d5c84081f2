//! Push-side insert sink

use bqstream_domain::{BqError, TableReference};
use futures::sink::{self, Sink};
use serde_json::Value;
use tracing::warn;

use super::RowInserter;

/// A sink that inserts every record sent into it.
///
/// A JSON array is one batch; any other value is a single record. Each
/// record gets a fresh insert id. A send completes only once its insert has
/// settled, so writers using `send` or `send_all` wait on the service.
/// Insert errors are returned to the writer and end the sink.
///
/// The sink is not `Unpin`; pin it (for example with `Box::pin`) before
/// using `SinkExt` combinators.
pub fn insert_sink(
    inserter: RowInserter,
    table: TableReference,
) -> impl Sink<Value, Error = BqError> + Send {
    sink::unfold((inserter, table), |(inserter, table), record: Value| async move {
        let records = match record {
            Value::Array(records) => records,
            record => vec![record],
        };
        if !inserter.insert_json(&table, records).await? {
            warn!(table = %table, "sink batch still had rejected rows");
        }
        Ok::<_, BqError>((inserter, table))
    })
}
