//! Wire payloads and decoded values

pub mod events;
pub mod job;
pub mod row;
pub mod table;
pub mod tabledata;

pub use events::QueryEvent;
pub use job::{
    Job, JobConfiguration, JobReference, JobState, JobStatus, QueryJobConfig, QueryRequest,
};
pub use row::{Cell, Row};
pub use table::{
    Dataset, DatasetReference, FieldType, Table, TableFieldSchema, TableReference, TableSchema,
};
pub use tabledata::{
    InsertAllRequest, InsertAllResponse, InsertError, InsertRow, ResultPage, WireCell, WireRow,
};
