//! Error types for patch parsing and application.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed patch at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported change to '{path}': {reason}")]
    Unsupported { path: PathBuf, reason: &'static str },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("patch source missing: {0}")]
    SourceMissing(PathBuf),

    #[error("failed to read patch '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("'{path}' is not valid UTF-8 text")]
    NotUtf8 { path: PathBuf },

    #[error("hunk #{hunk} does not apply to '{path}' (expected at line {line})")]
    HunkMismatch {
        path: PathBuf,
        hunk: usize,
        line: usize,
    },

    #[error("'{0}' already exists")]
    FileExists(PathBuf),

    #[error("'{0}' does not exist")]
    FileMissing(PathBuf),

    #[error("'{0}' still has content after its deletion hunks")]
    NotEmptyAfterDelete(PathBuf),

    #[error("git is not available: {0}")]
    GitUnavailable(#[source] io::Error),

    #[error("git {args} failed: {stderr}")]
    Git { args: String, stderr: String },

    #[error("patches '{first}' and '{second}' touch overlapping lines of '{file}'")]
    Overlap {
        file: PathBuf,
        first: String,
        second: String,
    },

    #[error("patch '{name}' does not apply: {diagnostic}")]
    ApplyFailed { name: String, diagnostic: String },

    #[error(transparent)]
    Fs(#[from] graft_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
