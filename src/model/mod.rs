//! Payload data model
//!
//! Defines the record submitted for persistence and its metadata handling.

pub mod payload;

pub use payload::{FALLBACK_NAME_PREFIX, Payload};
