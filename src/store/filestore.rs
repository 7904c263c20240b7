//! Atomic payload persistence
//!
//! Writes a validated payload to a file under the storage root exactly once,
//! crash-safely: serialize, size-check, write to a fresh temporary file in
//! the destination directory, fsync, then atomically rename into place. A
//! mid-write failure never leaves a partial destination file behind.

use log::{error, info, warn};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::Path;

use crate::config::AppConfig;
use crate::error::{SecurityError, StoreError};
use crate::model::{FALLBACK_NAME_PREFIX, Payload};
use crate::security;
use crate::store::results::PersistenceResult;

/// Directories: owner rwx, group/other rx
const DIR_MODE: u32 = 0o755;
/// Final files: owner rw, group/other r
const FILE_MODE: u32 = 0o644;
/// Temporary files stay private until the final chmod
const TEMP_FILE_MODE: u32 = 0o600;

/// Persist a validated payload under the configured storage root.
///
/// Assigns id and timestamp if missing (idempotent, never overwrites),
/// builds a sanitized filename, verifies the candidate path cannot escape
/// the storage root, and writes the serialized payload atomically.
pub fn persist(
    payload: &mut Payload,
    config: &AppConfig,
) -> Result<PersistenceResult, StoreError> {
    payload.ensure_id();
    payload.ensure_timestamp();

    let file_name = secure_file_name(payload)?;
    let storage_root = config.storage.storage_root_path();
    let final_path = storage_root.join(&file_name);

    security::is_secure_path(&final_path, &storage_root)?;

    let serialized = serde_json::to_vec_pretty(payload)?;

    let limit = config.storage.max_file_size_bytes();
    if serialized.len() as u64 > limit {
        return Err(StoreError::FileTooLarge {
            size: serialized.len() as u64,
            limit,
        });
    }

    if let Some(parent) = final_path.parent() {
        ensure_directory_exists(parent)?;
    }

    write_file_atomically(&final_path, &serialized)?;

    info!(
        "Persisted payload {} to {} ({} bytes)",
        payload.id,
        final_path.display(),
        serialized.len()
    );

    Ok(PersistenceResult {
        path: final_path,
        bytes: serialized.len() as u64,
    })
}

/// Preflight storage capacity check: the root must exist (created if
/// needed) and at least twice the maximum file size must be free.
///
/// Advisory only. A write racing this check can still exhaust the space;
/// correctness is carried by the atomic rename, not by this estimate.
pub fn check_capacity(config: &AppConfig) -> Result<u64, StoreError> {
    let storage_root = config.storage.storage_root_path();
    ensure_directory_exists(&storage_root)?;

    let available = fs2::available_space(&storage_root)?;
    let required = config.storage.max_file_size_bytes() * 2;

    if available < required {
        error!(
            "Insufficient space in {}: {} bytes available, {} required",
            storage_root.display(),
            available,
            required
        );
        return Err(StoreError::InsufficientSpace {
            available,
            required,
        });
    }

    Ok(available)
}

/// Build the storage filename for a payload, falling back to a secure
/// random name if the assembled name cannot be sanitized.
fn secure_file_name(payload: &Payload) -> Result<String, StoreError> {
    let base = payload.file_name();
    match security::sanitize_name(&base) {
        Ok(name) => Ok(name),
        Err(e) => {
            warn!(
                "Generated filename {:?} failed sanitization ({}); using random name",
                base, e
            );
            security::generate_random_name(FALLBACK_NAME_PREFIX, "json")
                .map_err(StoreError::Security)
        }
    }
}

/// Create the directory chain with 0755, treating an existing directory as
/// success and an existing non-directory as failure.
fn ensure_directory_exists(dir: &Path) -> Result<(), StoreError> {
    let dir_str = dir.to_str().ok_or(SecurityError::UnsafeCharacters)?;
    security::validate_path(dir_str, None)?;

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => return Ok(()),
        Ok(_) => {
            return Err(StoreError::DirectoryCreateFailed {
                path: dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "path exists but is not a directory",
                ),
            });
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(StoreError::DirectoryCreateFailed {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    }

    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| StoreError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Write data to `final_path` via a uniquely-named temporary file in the
/// same directory. The temporary file is removed on any failure.
fn write_file_atomically(final_path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let dir = final_path.parent().unwrap_or_else(|| Path::new("."));
    let temp_name = format!(".{}", security::generate_random_name("tmp-payload", "")?);
    let temp_path = dir.join(temp_name);

    let result = write_temp_then_rename(&temp_path, final_path, data);
    if result.is_err() {
        // Best effort; the destination is untouched either way.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp_then_rename(
    temp_path: &Path,
    final_path: &Path,
    data: &[u8],
) -> Result<(), StoreError> {
    // create_new refuses to reuse or follow anything already at this path
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(TEMP_FILE_MODE)
        .open(temp_path)
        .map_err(|e| StoreError::WriteFailed {
            path: temp_path.to_path_buf(),
            source: e,
        })?;

    temp_file
        .write_all(data)
        .map_err(|e| StoreError::WriteFailed {
            path: temp_path.to_path_buf(),
            source: e,
        })?;

    // Force to stable storage before the rename makes it visible
    temp_file.sync_all().map_err(|e| StoreError::WriteFailed {
        path: temp_path.to_path_buf(),
        source: e,
    })?;

    drop(temp_file);

    fs::set_permissions(temp_path, fs::Permissions::from_mode(FILE_MODE)).map_err(|e| {
        StoreError::WriteFailed {
            path: temp_path.to_path_buf(),
            source: e,
        }
    })?;

    fs::rename(temp_path, final_path).map_err(|e| StoreError::RenameFailed {
        path: final_path.to_path_buf(),
        source: e,
    })
}
