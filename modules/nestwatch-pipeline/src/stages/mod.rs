//! Stage handlers. Each one is a function from (task payload, shared store)
//! to store mutations plus zero or more new tasks; the queue is the only
//! channel between stages.

pub mod aggregate;
pub mod alert;
pub mod cleanup;
pub mod enrich;
pub mod ingest;

mod dispatch;
pub use dispatch::{dispatch, PipelineDeps};
