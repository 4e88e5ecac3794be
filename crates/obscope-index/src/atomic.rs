//! Write-to-temp-then-rename helper shared by the plan history index and the
//! label store, both of which persist small JSON documents that must never
//! be left half-written if the process dies mid-save.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| Error::Io { path: parent.to_path_buf(), source })?;
    }
    let body = serde_json::to_vec_pretty(value).map_err(|source| Error::Json { path: path.to_path_buf(), source })?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &body).map_err(|source| Error::Io { path: tmp_path.clone(), source })?;
    std::fs::rename(&tmp_path, path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
    Ok(())
}

/// Read `path` as JSON, returning `None` if it doesn't exist and `Err` only
/// on a real I/O failure. Callers treat a parse failure as "start empty"
/// (spec's Persistent-state error class) rather than propagating it.
pub fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let body = std::fs::read(path).ok()?;
    match serde_json::from_slice(&body) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "discarding unparseable persistent state");
            None
        }
    }
}
