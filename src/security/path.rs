//! Name sanitization and path validation
//!
//! Handles sanitization of untrusted strings into filesystem-safe names and
//! validation that candidate paths cannot escape a base directory.

use rand::RngCore;
use rand::rngs::OsRng;
use std::env;
use std::path::{Component, Path, PathBuf};

use crate::error::SecurityError;

/// Standard filesystem limit for a single name
pub const MAX_NAME_LENGTH: usize = 255;
/// Standard path limit
pub const MAX_PATH_LENGTH: usize = 4096;
/// Minimum bytes drawn for secure random name generation
pub const MIN_RANDOM_BYTES: usize = 8;

/// Replacement character for unsafe input
const PLACEHOLDER: char = '_';

/// Longest extension preserved when truncating an over-long name (with dot)
const MAX_PRESERVED_EXTENSION: usize = 10;

/// Legacy reserved device names that must not be used unprefixed
const RESERVED_DEVICE_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Characters never allowed in a filesystem name: path separators on any
/// platform, the drive separator, shell-meta glob characters, space, and all
/// control bytes.
fn is_unsafe_name_char(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '<' | '>' | '"' | '|' | '?' | '*' | ' ') || (c as u32) < 0x20
}

/// Sanitize an untrusted string into a filesystem-safe name.
///
/// Unsafe characters are replaced with `_` and runs collapsed, surrounding
/// `_`/`.` are stripped, reserved device names are neutralized with a `_`
/// prefix, and the result is truncated to 255 bytes preserving a short
/// extension when one is present.
pub fn sanitize_name(raw: &str) -> Result<String, SecurityError> {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return Err(SecurityError::EmptyInput);
    }

    let mut sanitized = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        let mapped = if is_unsafe_name_char(c) { PLACEHOLDER } else { c };
        if mapped == PLACEHOLDER && sanitized.ends_with(PLACEHOLDER) {
            continue;
        }
        sanitized.push(mapped);
    }

    // Leading/trailing placeholders and dots defeat hidden-file and
    // trailing-dot tricks.
    let trimmed = sanitized.trim_matches(|c| c == PLACEHOLDER || c == '.');
    if trimmed.is_empty() {
        return Err(SecurityError::InvalidName(raw.to_string()));
    }

    let mut name = trimmed.to_string();

    let stem = name.split('.').next().unwrap_or(&name).to_ascii_uppercase();
    if RESERVED_DEVICE_NAMES.contains(&stem.as_str()) {
        name.insert(0, PLACEHOLDER);
    }

    if name.len() > MAX_NAME_LENGTH {
        name = truncate_name(&name);
    }

    Ok(name)
}

/// Truncate an over-long name to `MAX_NAME_LENGTH` bytes, re-appending a
/// short extension when one is present.
fn truncate_name(name: &str) -> String {
    if let Some(idx) = name.rfind('.') {
        let ext = &name[idx..];
        if ext.len() > 1 && ext.len() < MAX_PRESERVED_EXTENSION {
            let base = &name[..idx];
            let max_base = MAX_NAME_LENGTH - ext.len();
            return format!("{}{}", truncate_at_boundary(base, max_base), ext);
        }
    }
    truncate_at_boundary(name, MAX_NAME_LENGTH).to_string()
}

/// Largest prefix of `s` of at most `max_bytes` bytes that ends on a char
/// boundary.
pub(crate) fn truncate_at_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut idx = max_bytes;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    &s[..idx]
}

/// Resolve `.` and `..` segments purely lexically, without touching the
/// filesystem. `..` at the start of a relative path is preserved; `..`
/// directly under the root collapses into the root.
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Validate that a path is safe and, when a base directory is supplied,
/// cannot escape it.
pub fn validate_path(path: &str, base_dir: Option<&Path>) -> Result<(), SecurityError> {
    if path.is_empty() {
        return Err(SecurityError::EmptyInput);
    }
    if path.contains('\0') {
        return Err(SecurityError::UnsafeCharacters);
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(SecurityError::PathTooLong(path.len()));
    }

    let cleaned = lexical_clean(Path::new(path));

    // A parent segment surviving lexical cleaning can only point outside.
    if cleaned
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(SecurityError::PathTraversal(path.to_string()));
    }

    if let Some(base) = base_dir {
        let abs_base = lexical_clean(&absolutize(base)?);
        let abs_candidate = lexical_clean(&absolutize(&cleaned)?);
        if !abs_candidate.starts_with(&abs_base) {
            return Err(SecurityError::PathTraversal(path.to_string()));
        }
    }

    Ok(())
}

/// Make a path absolute against the current directory, lexically. The
/// candidate may not exist yet, so `canonicalize` is not an option here.
fn absolutize(path: &Path) -> Result<PathBuf, SecurityError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

/// Combined security check for a full candidate path: the path must stay
/// within `base_dir` and its final component must survive sanitization.
pub fn is_secure_path(full_path: &Path, base_dir: &Path) -> Result<(), SecurityError> {
    let path_str = full_path.to_str().ok_or(SecurityError::UnsafeCharacters)?;
    validate_path(path_str, Some(base_dir))?;

    let file_name = full_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| SecurityError::InvalidName(path_str.to_string()))?;
    sanitize_name(file_name)?;

    Ok(())
}

/// Generate a random name from a cryptographically secure source.
///
/// Format: `<sanitized prefix>_<16 hex chars>.<sanitized extension>`, with
/// prefix and extension optional.
pub fn generate_random_name(prefix: &str, extension: &str) -> Result<String, SecurityError> {
    let mut bytes = [0u8; MIN_RANDOM_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(SecurityError::RandomSource)?;

    let mut name = String::new();
    if !prefix.is_empty() {
        name.push_str(&sanitize_name(prefix)?);
        name.push(PLACEHOLDER);
    }
    name.push_str(&hex::encode(bytes));

    if !extension.is_empty() {
        name.push('.');
        name.push_str(&sanitize_name(extension.trim_start_matches('.'))?);
    }

    Ok(name)
}
