use crate::model::Patch;
use crate::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A named patch loaded from disk.
#[derive(Clone, Debug)]
pub struct PatchFile {
    name: String,
    path: PathBuf,
    patch: Patch,
}

impl PatchFile {
    /// Read and parse the patch at `path`.
    ///
    /// A missing file is reported as [`Error::SourceMissing`], distinct from
    /// read and parse failures.
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::SourceMissing(path.to_path_buf()),
            ErrorKind::InvalidData => Error::NotUtf8 {
                path: path.to_path_buf(),
            },
            _ => Error::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Ok(Self {
            name: name.into(),
            path: path.to_path_buf(),
            patch: Patch::parse(&text)?,
        })
    }

    pub fn from_patch(name: impl Into<String>, path: impl Into<PathBuf>, patch: Patch) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            patch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Host-relative files this patch touches.
    pub fn targets(&self) -> Vec<PathBuf> {
        self.patch.targets()
    }
}
