pub mod atomic_write;
pub mod copy_dir;
pub mod remove;
pub mod symlink;

pub use atomic_write::{AtomicWriteOptions, atomic_read, atomic_write};
pub use copy_dir::copy_dir_all;
pub use remove::{remove_entry, remove_symlink};
pub use symlink::symlink_dir;
