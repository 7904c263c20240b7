//! File persistence
//!
//! Handles atomic persistence of validated payloads and storage capacity
//! preflight checks.

pub mod filestore;
pub mod results;

pub use filestore::{check_capacity, persist};
pub use results::PersistenceResult;
