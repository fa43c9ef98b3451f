//! Error types for installation.
//!
//! Only configuration problems and an invalid host root surface as `Err`
//! from a run; per-patch and per-mount failures are recorded in the report.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config '{path}': {source}")]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("invalid config '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file not found: {0}")]
    ConfigMissing(PathBuf),

    #[error("unknown mount mode '{0}' (expected 'link' or 'copy')")]
    UnknownMode(String),

    #[error("unknown patch engine '{0}' (expected 'builtin' or 'git')")]
    UnknownEngine(String),

    #[error("patch directory not found: {0}")]
    PatchDirMissing(PathBuf),

    #[error("failed to list patches in '{path}': {source}")]
    PatchDir { path: PathBuf, source: io::Error },

    #[error("'{root}' is not a valid host root (missing or unreadable: {})", missing.join(", "))]
    InvalidHost { root: PathBuf, missing: Vec<String> },

    #[error("mount source missing: {0}")]
    SourceMissing(PathBuf),

    #[error("refusing to replace '{target}': it is a {kind}, not a symlink")]
    Conflict { target: PathBuf, kind: &'static str },

    #[error("mount source and target are the same path: {0}")]
    SamePath(PathBuf),

    #[error("mount source and target overlap: '{inner}' is inside '{outer}'")]
    Nested { outer: PathBuf, inner: PathBuf },

    #[error("mount target '{target}' is outside the host root '{root}'")]
    OutsideHost { target: PathBuf, root: PathBuf },

    #[error(transparent)]
    Patch(#[from] graft_patch::Error),

    #[error(transparent)]
    Fs(#[from] graft_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
