//! Static installation config, read from `graft.toml` at the plugin root.
//!
//! Every section is optional; a missing file means all defaults.

use crate::{Error, Result};
use graft_manifest::{DEFAULT_MANIFEST_NAMES, DiscoveryOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const CONFIG_FILE: &str = "graft.toml";
pub const DEFAULT_MARKERS: [&str; 3] = ["api", "web", "docker"];
pub const DEFAULT_PATCH_DIR: &str = "patches";
pub const DEFAULT_NODE_TARGET: &str = "api/core/workflow/nodes/custom";
pub const DEFAULT_WEB_TARGET: &str = "web/app/components/workflow/nodes/custom";

/// How a plugin directory is made visible inside the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum MountMode {
    /// Directory symlink; edits to the source show up live.
    #[default]
    Link,
    /// Full recursive copy, replaced wholesale on every run.
    Copy,
}

impl MountMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Copy => "copy",
        }
    }
}

impl fmt::Display for MountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MountMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "link" => Ok(Self::Link),
            "copy" => Ok(Self::Copy),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for MountMode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Which mechanism applies patches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Builtin,
    Git,
}

impl EngineKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Git => "git",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" => Ok(Self::Builtin),
            "git" => Ok(Self::Git),
            other => Err(Error::UnknownEngine(other.to_string())),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Top-level directories that must all exist in a host root.
    pub markers: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct PatchesConfig {
    /// Directory scanned for `*.patch`. `None` means the default, which may
    /// be absent.
    pub dir: Option<PathBuf>,
    pub engine: EngineKind,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatchEntry {
    pub name: String,
    pub file: PathBuf,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MountEntry {
    /// Defaults to the last component of `source`.
    pub name: Option<String>,
    pub source: PathBuf,
    pub target: PathBuf,
    #[serde(default)]
    pub mode: MountMode,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Plugin-relative directory whose subdirectories hold manifests.
    pub root: PathBuf,
    pub manifest_names: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("nodes"),
            manifest_names: DEFAULT_MANIFEST_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DiscoveryConfig {
    pub fn options(&self) -> DiscoveryOptions {
        DiscoveryOptions::new().manifest_names(self.manifest_names.iter().cloned())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub host: HostConfig,
    pub patches: PatchesConfig,
    #[serde(rename = "patch")]
    pub patch_entries: Vec<PatchEntry>,
    /// `None` when the file declares no `[[mount]]`, so defaults apply.
    #[serde(rename = "mount")]
    pub mount_entries: Option<Vec<MountEntry>>,
    pub discovery: DiscoveryConfig,
}

impl Config {
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ConfigMissing(path.to_path_buf()),
            _ => Error::ConfigRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::parse(&text, path)
    }

    /// Load `explicit` if given, which must exist; otherwise `graft.toml`
    /// under `plugin_root`, falling back to defaults when it is absent.
    pub fn discover(plugin_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = plugin_root.join(CONFIG_FILE);
        match Self::load(&path) {
            Err(Error::ConfigMissing(_)) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn mounts(&self) -> Vec<MountEntry> {
        match &self.mount_entries {
            Some(entries) => entries.clone(),
            None => default_mounts(),
        }
    }
}

pub fn default_mounts() -> Vec<MountEntry> {
    vec![
        MountEntry {
            name: Some("nodes".into()),
            source: PathBuf::from("nodes"),
            target: PathBuf::from(DEFAULT_NODE_TARGET),
            mode: MountMode::Link,
        },
        MountEntry {
            name: Some("web".into()),
            source: PathBuf::from("web"),
            target: PathBuf::from(DEFAULT_WEB_TARGET),
            mode: MountMode::Link,
        },
    ]
}
