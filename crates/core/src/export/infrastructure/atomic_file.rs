use std::io::Write;
use std::path::Path;

use crate::export::domain::export_error::ExportError;

/// Writes `contents` to `path` so that readers see either the old file or
/// the complete new one.
///
/// Content goes to a temporary file in the destination directory first and
/// is renamed over `path` once flushed. On failure the temporary file is
/// removed and `path` is left as it was.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(contents).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    log::debug!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}
