//! Installs a plugin package into a host tree.
//!
//! # Architecture
//!
//! - `config.rs` - `graft.toml` schema and defaults
//! - `paths.rs` - resolves every patch, mount and marker path once per run
//! - `validator.rs` - concurrent marker probes deciding whether a root is a host
//! - `mount.rs` - link and copy mounts, planning and inspection
//! - `report.rs` - per-step outcomes and the run verdict
//! - `orchestrator.rs` - validate, patch, mount, report

pub use config::{
    CONFIG_FILE, Config, DiscoveryConfig, EngineKind, HostConfig, MountEntry, MountMode,
    PatchEntry, PatchesConfig,
};
pub use error::{Error, Result};
pub use mount::MountState;
pub use orchestrator::{FailurePolicy, Installer, RunOptions};
pub use paths::{InstallationPaths, MountSpec, PatchSpec};
pub use report::{Counts, DiscoveryReport, OperationKind, OperationResult, Outcome, RunReport};
pub use validator::{MarkerStatus, is_valid_host, probe_markers};

mod config;
mod error;
pub mod mount;
mod orchestrator;
mod paths;
mod report;
mod validator;
