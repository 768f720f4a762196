//! Snapshot files in `MessagePack`.
//!
//! Field names are kept (`to_vec_named`), so a snapshot can be read by tools
//! that know nothing of Lanthorn's Rust types.

use std::fs;
use std::path::Path;

use lanthorn_foundation::{Error, ErrorKind, Result};
use lanthorn_storage::WorldSnapshot;

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> Error {
    Error::new(ErrorKind::IoError(format!(
        "failed to {action} '{}': {err}",
        path.display()
    )))
}

/// Encodes a snapshot.
///
/// # Errors
///
/// Returns a `SerializationError` if encoding fails.
pub fn to_bytes(snapshot: &WorldSnapshot) -> Result<Vec<u8>> {
    rmp_serde::to_vec_named(snapshot)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Decodes a snapshot.
///
/// # Errors
///
/// Returns a `SerializationError` if the bytes are not a snapshot.
pub fn from_bytes(bytes: &[u8]) -> Result<WorldSnapshot> {
    rmp_serde::from_slice(bytes).map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Writes a snapshot to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an `IoError` if the file cannot be written.
pub fn save_to_file<P: AsRef<Path>>(snapshot: &WorldSnapshot, path: P) -> Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(snapshot)?;
    fs::write(path, bytes).map_err(|e| io_error("write", path, &e))?;
    tracing::info!(path = %path.display(), tick = snapshot.tick, "snapshot saved");
    Ok(())
}

/// Reads a snapshot from `path`.
///
/// # Errors
///
/// Returns an `IoError` if the file cannot be read, or a
/// `SerializationError` if it does not hold a snapshot.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<WorldSnapshot> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| io_error("read", path, &e))?;
    from_bytes(&bytes)
}
