//! Filesystem primitives used to graft a plugin tree into a host tree.
//!
//! # Architecture
//!
//! - `primitives/` - atomic write, directory symlink, recursive copy, removal
//! - `entry.rs` - non-following probes of what currently sits at a path
//! - `path.rs` - lexical normalization and absolutization

pub use entry::{EntryKind, probe};
pub use error::{Error, Result};
pub use path::{absolute, normalize};
pub use primitives::{
    AtomicWriteOptions, atomic_read, atomic_write, copy_dir_all, remove_entry, remove_symlink,
    symlink_dir,
};

mod entry;
mod error;
mod path;
pub mod primitives;
