//! Plugin manifests: parsing, validation and the node-type registry built by
//! scanning a plugin root. Discovery is read-only.

pub use discovery::{DEFAULT_MANIFEST_NAMES, Discovery, DiscoveryOptions, Rejected, discover};
pub use error::{Error, Result};
pub use manifest::{ManifestFormat, ManifestRecord};
pub use registry::Registry;

mod discovery;
mod error;
mod manifest;
mod registry;
