use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::Path;

/// What occupies a path, observed without following a final symlink.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Symlink,
    Dir,
    File,
}

/// Probe `path` with `symlink_metadata`.
///
/// Returns `Ok(None)` when nothing is there; other I/O failures are errors.
pub fn probe(path: impl AsRef<Path>) -> Result<Option<EntryKind>> {
    let path = path.as_ref();
    match path.symlink_metadata() {
        Ok(meta) => {
            let file_type = meta.file_type();
            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            Ok(Some(kind))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_probe_kinds() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        let sub = dir.path().join("sub");
        std::fs::write(&file, "x").unwrap();
        std::fs::create_dir(&sub).unwrap();

        assert_eq!(probe(&file).unwrap(), Some(EntryKind::File));
        assert_eq!(probe(&sub).unwrap(), Some(EntryKind::Dir));
        assert_eq!(probe(dir.path().join("missing")).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_dangling_symlink() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();

        assert_eq!(probe(&link).unwrap(), Some(EntryKind::Symlink));
    }
}
