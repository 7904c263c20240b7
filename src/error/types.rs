//! Error types
//!
//! Defines domain-specific error types for each module of the payload store.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Security module errors
#[derive(Debug)]
pub enum SecurityError {
    EmptyInput,
    UnsafeCharacters,
    InvalidName(String),
    NameTooLong(usize),
    PathTooLong(usize),
    PathTraversal(String),
    RandomSource(rand::Error),
    IoError(io::Error),
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityError::EmptyInput => write!(f, "Empty name or path"),
            SecurityError::UnsafeCharacters => write!(f, "Unsafe characters detected"),
            SecurityError::InvalidName(n) => write!(f, "Invalid name: {:?}", n),
            SecurityError::NameTooLong(len) => {
                write!(f, "Name too long: {} > {}", len, crate::security::MAX_NAME_LENGTH)
            }
            SecurityError::PathTooLong(len) => {
                write!(f, "Path too long: {} > {}", len, crate::security::MAX_PATH_LENGTH)
            }
            SecurityError::PathTraversal(p) => write!(f, "Path traversal attempt: {}", p),
            SecurityError::RandomSource(e) => {
                write!(f, "Failed to generate secure random bytes: {}", e)
            }
            SecurityError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SecurityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecurityError::RandomSource(e) => Some(e),
            SecurityError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SecurityError {
    fn from(error: io::Error) -> Self {
        SecurityError::IoError(error)
    }
}

/// Validation module errors
///
/// The first failing check is returned; errors from the recursive data walk
/// carry the JSON path of the offending value in `at`.
#[derive(Debug)]
pub enum ValidationError {
    MissingField(&'static str),
    EmptyField(&'static str),
    FieldTooShort { field: &'static str, len: usize, min: usize },
    FieldTooLong { field: &'static str, len: usize, max: usize },
    InvalidEncoding(&'static str),
    MalformedPayload(String),
    UnsafeCharacters(&'static str),
    DataTooLarge { size: u64, limit: u64 },
    NestingTooDeep { at: String, depth: usize, limit: usize },
    StringTooLong { at: String, len: usize, limit: usize },
    ArrayTooLong { at: String, len: usize, limit: usize },
    TooManyKeys { at: String, count: usize, limit: usize },
    InvalidKey { at: String, key: String },
    UnsupportedValueType { at: String, kind: String },
    ReservedFieldName(String),
    InvalidSourceFormat(String),
    InvalidTypeFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(field) => write!(f, "{} is required", field),
            ValidationError::EmptyField(field) => write!(f, "{} cannot be empty", field),
            ValidationError::FieldTooShort { field, len, min } => {
                write!(f, "{} too short: {} < {}", field, len, min)
            }
            ValidationError::FieldTooLong { field, len, max } => {
                write!(f, "{} too long: {} > {}", field, len, max)
            }
            ValidationError::InvalidEncoding(field) => write!(f, "invalid UTF-8 in {}", field),
            ValidationError::MalformedPayload(msg) => write!(f, "malformed payload: {}", msg),
            ValidationError::UnsafeCharacters(field) => {
                write!(f, "unsafe characters in {}", field)
            }
            ValidationError::DataTooLarge { size, limit } => {
                write!(f, "data size {} bytes exceeds limit {} bytes", size, limit)
            }
            ValidationError::NestingTooDeep { at, depth, limit } => {
                write!(f, "nesting depth {} exceeds maximum {} at {}", depth, limit, at)
            }
            ValidationError::StringTooLong { at, len, limit } => {
                write!(f, "string length {} exceeds maximum {} at {}", len, limit, at)
            }
            ValidationError::ArrayTooLong { at, len, limit } => {
                write!(f, "array length {} exceeds maximum {} at {}", len, limit, at)
            }
            ValidationError::TooManyKeys { at, count, limit } => {
                write!(f, "object key count {} exceeds maximum {} at {}", count, limit, at)
            }
            ValidationError::InvalidKey { at, key } => {
                write!(f, "object key {:?} too long at {}", key, at)
            }
            ValidationError::UnsupportedValueType { at, kind } => {
                write!(f, "unsupported value type {} at {}", kind, at)
            }
            ValidationError::ReservedFieldName(key) => {
                write!(f, "reserved field name '{}' not allowed in data", key)
            }
            ValidationError::InvalidSourceFormat(reason) => {
                write!(f, "invalid source format: {}", reason)
            }
            ValidationError::InvalidTypeFormat(reason) => {
                write!(f, "invalid type format: {}", reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Store module errors
#[derive(Debug)]
pub enum StoreError {
    Security(SecurityError),
    Serialization(serde_json::Error),
    FileTooLarge { size: u64, limit: u64 },
    InsufficientSpace { available: u64, required: u64 },
    DirectoryCreateFailed { path: PathBuf, source: io::Error },
    WriteFailed { path: PathBuf, source: io::Error },
    RenameFailed { path: PathBuf, source: io::Error },
    IoError(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Security(e) => write!(f, "Security check failed: {}", e),
            StoreError::Serialization(e) => write!(f, "Failed to serialize payload: {}", e),
            StoreError::FileTooLarge { size, limit } => {
                write!(f, "Payload size {} bytes exceeds limit {} bytes", size, limit)
            }
            StoreError::InsufficientSpace { available, required } => {
                write!(
                    f,
                    "Insufficient disk space: available {} bytes < required {} bytes",
                    available, required
                )
            }
            StoreError::DirectoryCreateFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "Failed to write {}: {}", path.display(), source)
            }
            StoreError::RenameFailed { path, source } => {
                write!(
                    f,
                    "Failed to rename temporary file to {}: {}",
                    path.display(),
                    source
                )
            }
            StoreError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Security(e) => Some(e),
            StoreError::Serialization(e) => Some(e),
            StoreError::DirectoryCreateFailed { source, .. } => Some(source),
            StoreError::WriteFailed { source, .. } => Some(source),
            StoreError::RenameFailed { source, .. } => Some(source),
            StoreError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SecurityError> for StoreError {
    fn from(error: SecurityError) -> Self {
        StoreError::Security(error)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Serialization(error)
    }
}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        StoreError::IoError(error)
    }
}

/// General error that encompasses all module error types
#[derive(Debug)]
pub enum HookstoreError {
    Validation(ValidationError),
    Security(SecurityError),
    Store(StoreError),
    Config(config::ConfigError),
    IoError(io::Error),
}

impl fmt::Display for HookstoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookstoreError::Validation(e) => write!(f, "Validation error: {}", e),
            HookstoreError::Security(e) => write!(f, "Security error: {}", e),
            HookstoreError::Store(e) => write!(f, "Store error: {}", e),
            HookstoreError::Config(e) => write!(f, "Configuration error: {}", e),
            HookstoreError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for HookstoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HookstoreError::Validation(e) => Some(e),
            HookstoreError::Security(e) => Some(e),
            HookstoreError::Store(e) => Some(e),
            HookstoreError::Config(e) => Some(e),
            HookstoreError::IoError(e) => Some(e),
        }
    }
}

impl From<ValidationError> for HookstoreError {
    fn from(error: ValidationError) -> Self {
        HookstoreError::Validation(error)
    }
}

impl From<SecurityError> for HookstoreError {
    fn from(error: SecurityError) -> Self {
        HookstoreError::Security(error)
    }
}

impl From<StoreError> for HookstoreError {
    fn from(error: StoreError) -> Self {
        HookstoreError::Store(error)
    }
}

impl From<config::ConfigError> for HookstoreError {
    fn from(error: config::ConfigError) -> Self {
        HookstoreError::Config(error)
    }
}

impl From<io::Error> for HookstoreError {
    fn from(error: io::Error) -> Self {
        HookstoreError::IoError(error)
    }
}
