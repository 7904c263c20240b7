//! Filename and path security
//!
//! Turns untrusted strings into filesystem-safe names and confines
//! candidate paths to the storage root.

pub mod path;

pub use path::{
    MAX_NAME_LENGTH, MAX_PATH_LENGTH, MIN_RANDOM_BYTES, generate_random_name, is_secure_path,
    lexical_clean, sanitize_name, validate_path,
};

pub(crate) use path::truncate_at_boundary;
