//! Error handling
//!
//! Defines error types and handling for the payload store.

pub mod types;

pub use types::*;
