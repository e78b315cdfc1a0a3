//! Service layer for the admin console.
//! - Task ledger statistics and listings, blob housekeeping, batch deletion.
//! - Holiday calendar queries and merge-upserts.
//! - Composite health report over the database and downstream services.
//!
//! Every component talks to storage through the traits in [`store`].

pub mod errors;
pub mod pagination;
pub mod store;
pub mod blob;
pub mod ledger;
pub mod batch_delete;
pub mod calendar;
pub mod health;
pub mod metrics;
pub mod context;
#[cfg(test)]
pub mod test_support;

pub use context::{AppContext, Services};
