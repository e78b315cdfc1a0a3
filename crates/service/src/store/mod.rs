//! Document store adapter: domain types, repository traits, and the
//! Postgres and in-memory implementations.

pub mod domain;
pub mod memory;
pub mod repository;
pub mod seaorm;

pub use domain::{BlobId, DatabaseStats, HolidayDocument, TaskId, TaskRecord, UpsertOutcome};
pub use repository::{CalendarStore, LedgerStore, TaskFilter};
