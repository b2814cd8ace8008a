//! Storyloom Storage Layer
//!
//! Implements the `ContentStore` trait from the domain crate.
//!
//! # Adapters
//!
//! - [`MemoryStore`]: in-memory reference implementation, used by tests
//!   and as the reference for store semantics
//! - [`SqliteStore`]: SQLite-backed persistence
//!
//! Both enforce per-entity optimistic locking: every update carries the
//! version the caller read, and a mismatch fails with
//! [`StoreError::VersionConflict`] without mutating anything.
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe. Callers share a store behind
//! a mutex (the pipeline does exactly that); each thread may instead
//! open its own SqliteStore over the same file.

#![warn(missing_docs)]

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data encountered during (de)serialization
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Optimistic version check failed
    #[error("Version conflict on {entity}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Which entity the conflict occurred on
        entity: String,
        /// Version the caller expected
        expected: u64,
        /// Version actually in the store
        actual: u64,
    },
}
