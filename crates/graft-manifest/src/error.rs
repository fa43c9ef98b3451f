use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to scan '{path}': {source}")]
    Scan { path: PathBuf, source: io::Error },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid TOML in '{path}': {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("'{path}' has no supported manifest extension")]
    UnsupportedFormat { path: PathBuf },

    #[error("'{path}': required field '{field}' is missing or empty")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("node type '{node_type}' is declared by both '{first}' and '{second}'")]
    DuplicateNodeType {
        node_type: String,
        first: PathBuf,
        second: PathBuf,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
