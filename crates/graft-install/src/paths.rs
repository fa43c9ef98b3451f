//! Path resolution. Everything a run touches is derived here once, from the
//! plugin root, the host root and the config.

use crate::config::{Config, MountMode};
use crate::{Error, Result};
use graft_fs::{absolute, normalize};
use graft_patch::PatchFile;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchSpec {
    pub name: String,
    pub file: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MountSpec {
    pub name: String,
    pub source: PathBuf,
    pub target: PathBuf,
    pub mode: MountMode,
}

/// Absolute, normalized paths for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallationPaths {
    plugin_root: PathBuf,
    host_root: PathBuf,
    markers: Vec<String>,
    patches: Vec<PatchSpec>,
    mounts: Vec<MountSpec>,
    discovery_root: PathBuf,
}

impl InstallationPaths {
    /// Resolve every path in `config`. Relative patch files and mount sources
    /// are taken from the plugin root, relative mount targets from the host
    /// root. `mode` overrides every configured mount mode.
    ///
    /// A mount target that normalizes to a path outside the host root is
    /// rejected with [`Error::OutsideHost`].
    pub fn resolve(
        plugin_root: impl AsRef<Path>,
        host_root: impl AsRef<Path>,
        config: &Config,
        mode: Option<MountMode>,
    ) -> Result<Self> {
        let plugin_root = absolute(plugin_root)?;
        let host_root = absolute(host_root)?;

        let mut patches: Vec<PatchSpec> = config
            .patch_entries
            .iter()
            .map(|entry| PatchSpec {
                name: entry.name.clone(),
                file: normalize(plugin_root.join(&entry.file)),
            })
            .collect();

        if config.patch_entries.is_empty() || config.patches.dir.is_some() {
            patches.extend(scan_patch_dir(&plugin_root, config.patches.dir.as_deref())?);
        }

        let mounts = config
            .mounts()
            .into_iter()
            .map(|entry| {
                let source = normalize(plugin_root.join(&entry.source));
                let name = entry.name.clone().unwrap_or_else(|| {
                    source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| source.display().to_string())
                });
                let target = normalize(host_root.join(&entry.target));
                if target == host_root || !target.starts_with(&host_root) {
                    return Err(Error::OutsideHost {
                        target,
                        root: host_root.clone(),
                    });
                }
                Ok(MountSpec {
                    name,
                    source,
                    target,
                    mode: mode.unwrap_or(entry.mode),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            discovery_root: normalize(plugin_root.join(&config.discovery.root)),
            markers: config.host.markers.clone(),
            plugin_root,
            host_root,
            patches,
            mounts,
        })
    }

    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    pub fn host_root(&self) -> &Path {
        &self.host_root
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn patches(&self) -> &[PatchSpec] {
        &self.patches
    }

    pub fn mounts(&self) -> &[MountSpec] {
        &self.mounts
    }

    pub fn discovery_root(&self) -> &Path {
        &self.discovery_root
    }

    /// Absolute host paths of the files `patch` touches.
    pub fn patch_targets(&self, patch: &PatchFile) -> Vec<PathBuf> {
        patch
            .targets()
            .into_iter()
            .map(|rel| normalize(self.host_root.join(rel)))
            .collect()
    }
}

/// Every `*.patch` directly under the patch directory, in file name order.
///
/// The default directory may be absent; a configured one must exist.
fn scan_patch_dir(plugin_root: &Path, configured: Option<&Path>) -> Result<Vec<PatchSpec>> {
    let dir = normalize(plugin_root.join(configured.unwrap_or(Path::new(crate::config::DEFAULT_PATCH_DIR))));

    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if configured.is_some() {
                return Err(Error::PatchDirMissing(dir));
            }
            return Ok(Vec::new());
        }
        Err(e) => return Err(Error::PatchDir { path: dir, source: e }),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::PatchDir {
                path: dir.clone(),
                source: e,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "patch") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        warn!(dir = %dir.display(), "no patch files found");
    }

    Ok(files
        .into_iter()
        .map(|file| PatchSpec {
            name: file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file,
        })
        .collect())
}
