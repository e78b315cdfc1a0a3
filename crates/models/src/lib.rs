//! Persistence model: sea-orm entities for the calendar and the task ledger,
//! plus the constrained value type used for free-form document fields.

pub mod errors;
pub mod db;
pub mod value;
pub mod holiday;
pub mod task;
pub mod blob_file;
pub mod blob_chunk;

#[cfg(test)]
mod tests;
