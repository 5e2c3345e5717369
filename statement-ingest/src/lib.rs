//! statement-ingest: statement file intake, line/field splitting and row batching.

pub mod batch;
pub mod source;
pub mod split;

pub use batch::{batch_count, batch_rows, Batch, BatchSize, ZeroBatchSize, DEFAULT_BATCH_SIZE};
pub use source::{check_statement_type, read_statement, IngestError};
pub use split::{parse_csv, split_fields, split_statement, StatementLines};
