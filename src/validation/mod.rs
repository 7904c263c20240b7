//! Payload validation
//!
//! Structural, content, and business-rule validation of submitted payloads
//! against the configured policy.

pub mod validator;

pub use validator::{validate, validate_content, validate_structure};
