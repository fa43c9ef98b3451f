use crate::{EntryKind, Error, Result, probe};
use std::fs;
use std::path::Path;

/// Remove whatever sits at `path` without following symlinks.
///
/// Directories are removed recursively; a symlink is removed as a link and
/// its target is left alone. A missing path is not an error.
pub fn remove_entry(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let removal = match probe(path)? {
        None => return Ok(()),
        Some(EntryKind::Symlink) => return remove_symlink(path),
        Some(EntryKind::Dir) => fs::remove_dir_all(path),
        Some(EntryKind::File) => fs::remove_file(path),
    };
    removal.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Remove the symlink at `path`.
pub fn remove_symlink(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    #[cfg(unix)]
    let removal = fs::remove_file(path);

    // Directory symlinks and junctions are removed as directories on Windows.
    #[cfg(windows)]
    let removal = fs::remove_dir(path).or_else(|_| fs::remove_file(path));

    removal.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}
