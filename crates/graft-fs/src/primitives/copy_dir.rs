use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Recursively copy `src` into `dest`, overwriting files that already exist.
///
/// Symlinks inside `src` are recreated as symlinks with the same target
/// rather than followed.
pub fn copy_dir_all(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    fs::create_dir_all(dest).map_err(|e| Error::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    for entry in fs::read_dir(src).map_err(|e| Error::Read {
        path: src.to_path_buf(),
        source: e,
    })? {
        let entry = entry.map_err(|e| Error::Read {
            path: src.to_path_buf(),
            source: e,
        })?;
        let file_type = entry.file_type().map_err(|e| Error::Read {
            path: entry.path(),
            source: e,
        })?;

        let src_path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir_all(&src_path, &dest_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dest_path)?;
        } else {
            fs::copy(&src_path, &dest_path).map_err(|e| Error::Write {
                path: dest_path,
                source: e,
            })?;
        }
    }
    Ok(())
}

fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| Error::Read {
        path: src.to_path_buf(),
        source: e,
    })?;
    if dest.symlink_metadata().is_ok() {
        crate::remove_entry(dest)?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, dest).map_err(|e| Error::Symlink {
            target,
            link: dest.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        if src.is_dir() {
            crate::symlink_dir(&target, dest)
        } else {
            std::os::windows::fs::symlink_file(&target, dest).map_err(|e| Error::Symlink {
                target,
                link: dest.to_path_buf(),
                source: e,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_dir_all() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(src.join("subdir")).unwrap();
        fs::write(src.join("file.txt"), "data").unwrap();
        fs::write(src.join("subdir/nested.txt"), "nested").unwrap();

        copy_dir_all(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("file.txt")).unwrap(), "data");
        assert_eq!(
            fs::read_to_string(dest.join("subdir/nested.txt")).unwrap(),
            "nested"
        );
    }

    #[test]
    fn test_copy_dir_all_overwrites() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("file.txt"), "new").unwrap();
        fs::write(dest.join("file.txt"), "old").unwrap();

        copy_dir_all(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("file.txt")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_dir_all_keeps_symlinks() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink("real.txt", src.join("alias.txt")).unwrap();

        copy_dir_all(&src, &dest).unwrap();

        let alias = dest.join("alias.txt");
        assert!(alias.symlink_metadata().unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&alias).unwrap(), Path::new("real.txt"));
        assert_eq!(fs::read_to_string(alias).unwrap(), "real");
    }
}
