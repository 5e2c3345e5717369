//! statement-core: transaction model, aggregation engine, dashboard view
//! state, run state and the project list.
//!
//! Nothing in this crate performs I/O except through the `KeyValueStore`
//! handed to `ProjectList`.

pub mod aggregate;
pub mod projects;
pub mod run;
pub mod store;
pub mod transaction;
pub mod view;

pub use aggregate::{Filter, FilterOption, Grouping, Summary};
pub use projects::{Confirmation, ProjectError, ProjectList, EXPORT_FILE_NAME, PROJECTS_KEY};
pub use run::{RunPhase, RunState};
pub use store::{KeyValueStore, MemoryStore};
pub use transaction::{
    assign_ids, ExtractedTransaction, Transaction, TransactionId, UNASSIGNED_PROJECT,
    UNKNOWN_SUPPLIER,
};
pub use view::{Dashboard, DashboardView, ViewError, ViewState};
