//! Patch engines: the mechanism that checks and applies a patch against a
//! tree. The three-way classification on top lives in [`crate::applier`].

use crate::apply::{Fit, TextFile, apply_hunks};
use crate::model::{FileChange, Patch};
use crate::{Error, PatchFile, Result};
use graft_fs::{AtomicWriteOptions, atomic_read, atomic_write};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Checks and applies patches against a working tree rooted at `root`.
pub trait PatchEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Would the patch apply forward? Never writes. Reports whether any hunk
    /// only matched away from its stated line.
    fn check(&self, patch: &PatchFile, root: &Path) -> Result<Fit>;

    /// Apply the patch forward. Either every file is rewritten or none is.
    fn apply(&self, patch: &PatchFile, root: &Path) -> Result<()>;

    /// Would the patch apply in reverse? Never writes.
    fn check_reverse(&self, patch: &PatchFile, root: &Path) -> Result<Fit>;
}

/// Pure Rust engine: hunks are matched exactly, all rewrites are computed in
/// memory before the first write, and a failed write rolls back the files
/// already written.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinEngine;

impl PatchEngine for BuiltinEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn check(&self, patch: &PatchFile, root: &Path) -> Result<Fit> {
        plan(patch.patch(), root).map(|(_, fit)| fit)
    }

    fn apply(&self, patch: &PatchFile, root: &Path) -> Result<()> {
        let (changes, _) = plan(patch.patch(), root)?;
        commit(changes)
    }

    fn check_reverse(&self, patch: &PatchFile, root: &Path) -> Result<Fit> {
        plan(&patch.patch().reversed(), root).map(|(_, fit)| fit)
    }
}

#[derive(Debug)]
struct Change {
    path: PathBuf,
    /// `None` deletes the file.
    content: Option<TextFile>,
}

fn plan(patch: &Patch, root: &Path) -> Result<(Vec<Change>, Fit)> {
    let mut staged: Vec<Change> = Vec::new();
    let mut fit = Fit::Exact;

    for file in &patch.files {
        let rel = file.target();
        let path = resolve(root, rel)?;
        let base = match staged.iter().find(|c| c.path == path) {
            Some(change) => change.content.clone(),
            None => read_text(&path, rel)?,
        };

        let mismatch = |m: crate::apply::Mismatch| Error::HunkMismatch {
            path: rel.to_path_buf(),
            hunk: m.hunk,
            line: m.line,
        };

        let (content, file_fit) = match (file.change(), base) {
            (FileChange::Create, Some(_)) => return Err(Error::FileExists(rel.to_path_buf())),
            (FileChange::Create, None) => {
                let (created, fit) = apply_hunks(&TextFile::default(), &file.hunks).map_err(mismatch)?;
                (Some(created), fit)
            }
            (_, None) => return Err(Error::FileMissing(rel.to_path_buf())),
            (FileChange::Delete, Some(base)) => {
                let (rest, fit) = apply_hunks(&base, &file.hunks).map_err(mismatch)?;
                if !rest.is_empty() {
                    return Err(Error::NotEmptyAfterDelete(rel.to_path_buf()));
                }
                (None, fit)
            }
            (FileChange::Modify, Some(base)) => {
                let (patched, fit) = apply_hunks(&base, &file.hunks).map_err(mismatch)?;
                (Some(patched), fit)
            }
        };
        fit = fit.join(file_fit);

        match staged.iter_mut().find(|c| c.path == path) {
            Some(change) => change.content = content,
            None => staged.push(Change { path, content }),
        }
    }

    Ok((staged, fit))
}

fn commit(changes: Vec<Change>) -> Result<()> {
    let mut done: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::new();

    for change in &changes {
        let original = std::fs::read(&change.path).ok();
        if let Err(e) = write_change(change) {
            warn!(path = %change.path.display(), error = %e, "patch write failed, rolling back");
            rollback(&done);
            return Err(e);
        }
        debug!(path = %change.path.display(), "rewrote file");
        done.push((change.path.clone(), original));
    }
    Ok(())
}

fn write_change(change: &Change) -> Result<()> {
    match &change.content {
        Some(text) => {
            if let Some(parent) = change.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| graft_fs::Error::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            atomic_write(
                &change.path,
                text.render().as_bytes(),
                AtomicWriteOptions::new().preserve_permissions(true).sync(true),
            )?;
        }
        None => {
            std::fs::remove_file(&change.path).map_err(|e| graft_fs::Error::Remove {
                path: change.path.clone(),
                source: e,
            })?;
        }
    }
    Ok(())
}

fn rollback(done: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, original) in done.iter().rev() {
        let restored = match original {
            Some(bytes) => atomic_write(path, bytes, AtomicWriteOptions::new()).map_err(|e| e.to_string()),
            None => std::fs::remove_file(path).map_err(|e| e.to_string()),
        };
        if let Err(e) = restored {
            warn!(path = %path.display(), error = %e, "rollback failed");
        }
    }
}

fn read_text(path: &Path, rel: &Path) -> Result<Option<TextFile>> {
    let bytes = match atomic_read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.io().kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let text = String::from_utf8(bytes).map_err(|_| Error::NotUtf8 {
        path: rel.to_path_buf(),
    })?;
    Ok(Some(TextFile::parse(&text)))
}

/// Join a patch-relative path onto `root`, refusing anything that could
/// escape it.
pub(crate) fn resolve(root: &Path, rel: &Path) -> Result<PathBuf> {
    if rel.as_os_str().is_empty() {
        return Err(Error::InvalidPath {
            path: rel.to_path_buf(),
            reason: "path is empty",
        });
    }
    if rel.is_absolute() {
        return Err(Error::InvalidPath {
            path: rel.to_path_buf(),
            reason: "absolute paths are not allowed",
        });
    }
    for component in rel.components() {
        if matches!(component, Component::ParentDir | Component::Prefix(_)) {
            return Err(Error::InvalidPath {
                path: rel.to_path_buf(),
                reason: "path traversal is not allowed",
            });
        }
    }
    Ok(root.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HOOK: &str = "\
--- a/app/nodes.py
+++ b/app/nodes.py
@@ -1,2 +1,3 @@
 NODES = {}
+NODES.update(load_custom())

";

    fn patch_file(text: &str) -> PatchFile {
        PatchFile::from_patch("hook", "hook.patch", Patch::parse(text).unwrap())
    }

    fn host() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::write(dir.path().join("app/nodes.py"), "NODES = {}\n\n").unwrap();
        dir
    }

    #[test]
    fn test_builtin_apply_and_reverse_check() {
        let dir = host();
        let patch = patch_file(HOOK);

        assert_eq!(BuiltinEngine.check(&patch, dir.path()).unwrap(), Fit::Exact);
        assert!(BuiltinEngine.check_reverse(&patch, dir.path()).is_err());

        BuiltinEngine.apply(&patch, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app/nodes.py")).unwrap(),
            "NODES = {}\nNODES.update(load_custom())\n\n"
        );

        assert!(BuiltinEngine.check(&patch, dir.path()).is_err());
        BuiltinEngine.check_reverse(&patch, dir.path()).unwrap();
    }

    #[test]
    fn test_builtin_check_does_not_write() {
        let dir = host();
        BuiltinEngine.check(&patch_file(HOOK), dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app/nodes.py")).unwrap(),
            "NODES = {}\n\n"
        );
    }

    #[test]
    fn test_builtin_multi_file_is_all_or_nothing() {
        let dir = host();
        let text = format!("{HOOK}--- a/app/missing.py\n+++ b/app/missing.py\n@@ -1 +1 @@\n-a\n+b\n");
        let err = BuiltinEngine.apply(&patch_file(&text), dir.path()).unwrap_err();

        assert!(matches!(err, Error::FileMissing(_)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app/nodes.py")).unwrap(),
            "NODES = {}\n\n"
        );
    }

    #[test]
    fn test_builtin_create_and_delete() {
        let dir = host();
        let create = patch_file("--- /dev/null\n+++ b/app/extra.py\n@@ -0,0 +1 @@\n+EXTRA = 1\n");
        BuiltinEngine.apply(&create, dir.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("app/extra.py")).unwrap(),
            "EXTRA = 1\n"
        );
        assert!(matches!(
            BuiltinEngine.check(&create, dir.path()),
            Err(Error::FileExists(_))
        ));

        let delete = PatchFile::from_patch("rm", "rm.patch", create.patch().reversed());
        BuiltinEngine.apply(&delete, dir.path()).unwrap();
        assert!(!dir.path().join("app/extra.py").exists());
    }

    #[test]
    fn test_resolve_rejects_escape() {
        let root = Path::new("/host");
        assert!(resolve(root, Path::new("../etc/passwd")).is_err());
        assert!(resolve(root, Path::new("/etc/passwd")).is_err());
        assert_eq!(
            resolve(root, Path::new("api/app.py")).unwrap(),
            PathBuf::from("/host/api/app.py")
        );
    }
}
