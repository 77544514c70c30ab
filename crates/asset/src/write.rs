//! Persisting packed assets without leaving partial files behind.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{Builder, NamedTempFile};

use crate::error::{AssetError, AssetResult};

/// Write `bytes` to `path` via a sibling temp file and rename.
///
/// An existing file at `path` is replaced only once every byte is on disk;
/// on failure it is left untouched and the temp file is removed. The result
/// keeps the destination's permissions, or gets the umask default when new.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> AssetResult<()> {
    let path = path.as_ref();
    let io_err = |source: io::Error| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = parent_dir(path);
    let mut tmp = temp_file_in(&dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file()
            .set_permissions(existing.permissions())
            .map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Temp files default to 0600; ask for 0666 so the umask decides, as it
/// would for a plain create.
#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    Builder::new().tempfile_in(dir)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
