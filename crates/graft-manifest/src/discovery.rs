use crate::{Error, ManifestRecord, Registry, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MANIFEST_NAMES: [&str; 2] = ["manifest.json", "manifest.toml"];

#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
    /// File names looked up in each plugin directory, first match wins.
    pub manifest_names: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiscoveryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manifest_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest_names = names.into_iter().map(Into::into).collect();
        self
    }
}

/// A manifest that was found but could not be accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Discovery {
    pub registry: Registry,
    pub rejected: Vec<Rejected>,
    /// Directories without any manifest.
    pub skipped: Vec<PathBuf>,
}

impl Discovery {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Scan the immediate subdirectories of `root` for manifests.
///
/// Hidden directories are ignored and entries are visited in name order.
/// Invalid manifests are collected in [`Discovery::rejected`]; a node type
/// declared by two directories fails the scan. Nothing is written.
pub fn discover(root: impl AsRef<Path>, options: &DiscoveryOptions) -> Result<Discovery> {
    let root = root.as_ref();
    let mut dirs = list_dirs(root)?;
    dirs.sort();

    let mut records = Vec::new();
    let mut discovery = Discovery::default();

    for dir in dirs {
        let Some(manifest) = options
            .manifest_names
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
        else {
            debug!(dir = %dir.display(), "no manifest, skipping");
            discovery.skipped.push(dir);
            continue;
        };

        match ManifestRecord::load(&manifest) {
            Ok(record) => {
                debug!(node_type = %record.node_type, path = %manifest.display(), "found manifest");
                records.push(record);
            }
            Err(e) => {
                warn!(path = %manifest.display(), error = %e, "rejected manifest");
                discovery.rejected.push(Rejected {
                    path: manifest,
                    reason: e.to_string(),
                });
            }
        }
    }

    discovery.registry = Registry::from_records(records)?;
    Ok(discovery)
}

fn list_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let scan_err = |e| Error::Scan {
        path: root.to_path_buf(),
        source: e,
    };

    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root).map_err(scan_err)? {
        let entry = entry.map_err(scan_err)?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let path = entry.path();
        if !hidden && path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}
