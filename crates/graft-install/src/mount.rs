//! Mounting a plugin directory into the host, as a symlink or a copy.
//!
//! A link mount only ever replaces a symlink. A copy mount replaces whatever
//! is at the target. Neither accepts a source and target that contain one
//! another.

use crate::config::MountMode;
use crate::paths::MountSpec;
use crate::{Error, Result};
use graft_fs::{EntryKind, copy_dir_all, probe, remove_entry, remove_symlink, symlink_dir};
use std::path::Path;
use tracing::{debug, info};

/// What currently sits at a mount target, relative to its spec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountState {
    InPlace,
    Absent,
    /// Something is there but it is not this mount.
    Stale(String),
}

/// Establish `spec`, replacing any earlier mount at its target.
pub fn establish(spec: &MountSpec) -> Result<()> {
    check_source(spec)?;
    match spec.mode {
        MountMode::Link => link(&spec.source, &spec.target),
        MountMode::Copy => copy(&spec.source, &spec.target),
    }
}

/// Run the checks `establish` would make, without touching anything.
pub fn plan(spec: &MountSpec) -> Result<()> {
    check_source(spec)?;
    if spec.mode == MountMode::Link {
        check_link_target(&spec.target)?;
    }
    Ok(())
}

/// Compare the target against `spec` without touching anything.
pub fn inspect(spec: &MountSpec) -> Result<MountState> {
    let state = match (spec.mode, probe(&spec.target)?) {
        (_, None) => MountState::Absent,
        (MountMode::Link, Some(EntryKind::Symlink)) => {
            let resolved = std::fs::canonicalize(&spec.target).ok();
            let source = std::fs::canonicalize(&spec.source).ok();
            match (resolved, source) {
                (Some(a), Some(b)) if a == b => MountState::InPlace,
                (Some(a), _) => MountState::Stale(format!("symlink points at {}", a.display())),
                (None, _) => MountState::Stale("dangling symlink".into()),
            }
        }
        (MountMode::Link, Some(kind)) => {
            MountState::Stale(format!("{} where a symlink is expected", describe(kind)))
        }
        (MountMode::Copy, Some(EntryKind::Dir)) => MountState::InPlace,
        (MountMode::Copy, Some(kind)) => {
            MountState::Stale(format!("{} where a directory is expected", describe(kind)))
        }
    };
    Ok(state)
}

fn check_source(spec: &MountSpec) -> Result<()> {
    if spec.source == spec.target {
        return Err(Error::SamePath(spec.source.clone()));
    }
    if spec.source.starts_with(&spec.target) {
        return Err(Error::Nested {
            outer: spec.target.clone(),
            inner: spec.source.clone(),
        });
    }
    if spec.target.starts_with(&spec.source) {
        return Err(Error::Nested {
            outer: spec.source.clone(),
            inner: spec.target.clone(),
        });
    }
    if !spec.source.is_dir() {
        return Err(Error::SourceMissing(spec.source.clone()));
    }
    Ok(())
}

fn check_link_target(target: &Path) -> Result<Option<EntryKind>> {
    match probe(target)? {
        Some(EntryKind::Symlink) => Ok(Some(EntryKind::Symlink)),
        Some(kind) => Err(Error::Conflict {
            target: target.to_path_buf(),
            kind: describe(kind),
        }),
        None => Ok(None),
    }
}

fn link(source: &Path, target: &Path) -> Result<()> {
    if check_link_target(target)?.is_some() {
        debug!(target = %target.display(), "replacing existing symlink");
        remove_symlink(target)?;
    }
    ensure_parent(target)?;
    symlink_dir(source, target)?;
    info!(source = %source.display(), target = %target.display(), "linked");
    Ok(())
}

fn copy(source: &Path, target: &Path) -> Result<()> {
    if probe(target)?.is_some() {
        debug!(target = %target.display(), "removing existing target before copy");
        remove_entry(target)?;
    }
    ensure_parent(target)?;
    copy_dir_all(source, target)?;
    info!(source = %source.display(), target = %target.display(), "copied");
    Ok(())
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| graft_fs::Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

fn describe(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Symlink => "symlink",
        EntryKind::Dir => "directory",
        EntryKind::File => "file",
    }
}
