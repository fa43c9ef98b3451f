use crate::{Error, Result};
use std::path::Path;

/// Create a directory symlink at `link` pointing at `target`.
///
/// On Windows a junction is used when the process lacks the symlink
/// privilege.
pub fn symlink_dir(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| Error::Symlink {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        match std::os::windows::fs::symlink_dir(target, link) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                junction::create(target, link).map_err(|e| Error::Symlink {
                    target: target.to_path_buf(),
                    link: link.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => Err(Error::Symlink {
                target: target.to_path_buf(),
                link: link.to_path_buf(),
                source: e,
            }),
        }
    }
}
