//! Store result types
//!
//! Defines result structures returned by persistence operations.

use std::path::PathBuf;

/// Result of a successful persist operation
#[derive(Debug, Clone)]
pub struct PersistenceResult {
    /// Absolute path of the written file
    pub path: PathBuf,
    /// Serialized size in bytes
    pub bytes: u64,
}
