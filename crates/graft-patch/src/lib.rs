//! Unified-diff patches applied idempotently to a host tree.
//!
//! # Architecture
//!
//! - `model.rs` / `parse.rs` - the diff model and its git-style parser
//! - `apply.rs` - exact, in-memory hunk application
//! - `engine.rs` / `git.rs` - engines that check and apply a patch under a root
//! - `applier.rs` - forward apply, falling back to a reverse check to detect
//!   patches that are already in place
//! - `overlap.rs` - static rejection of patch sets that fight over lines

pub use applier::{ApplyMode, PatchApplier, PatchStatus};
pub use apply::{Fit, Mismatch, TextFile, apply_hunks};
pub use engine::{BuiltinEngine, PatchEngine};
pub use error::{Error, Result};
pub use git::GitEngine;
pub use model::{FileChange, FilePatch, Hunk, Line, Patch};
pub use overlap::check_overlaps;
pub use patch_file::PatchFile;

mod applier;
mod apply;
mod engine;
mod error;
mod git;
mod model;
mod overlap;
mod parse;
mod patch_file;
