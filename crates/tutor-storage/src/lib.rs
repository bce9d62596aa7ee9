// crates/tutor-storage/src/lib.rs
//! Append-only persistence for feedback, hint and explanation records.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
