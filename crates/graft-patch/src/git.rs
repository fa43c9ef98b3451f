use crate::apply::Fit;
use crate::engine::PatchEngine;
use crate::{Error, PatchFile, Result};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Delegates to `git apply`, run from the host root.
///
/// `git apply` does not need the root to be a repository. The patch path
/// handed to git is made absolute first.
#[derive(Clone, Debug)]
pub struct GitEngine {
    program: PathBuf,
}

impl Default for GitEngine {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Fails with [`Error::GitUnavailable`] when `git --version` cannot be
    /// spawned or exits unsuccessfully.
    pub fn ensure_available(&self) -> Result<()> {
        let output = Command::new(&self.program)
            .arg("--version")
            .output()
            .map_err(Error::GitUnavailable)?;
        if !output.status.success() {
            return Err(Error::GitUnavailable(io::Error::other(format!(
                "git --version exited with {}",
                output.status
            ))));
        }
        Ok(())
    }

    /// Run `git apply` with `flags`, returning its stderr on success.
    fn run(&self, root: &Path, patch: &PatchFile, flags: &[&str]) -> Result<String> {
        let patch_path = graft_fs::absolute(patch.path())?;
        let mut args: Vec<OsString> = vec!["apply".into()];
        args.extend(flags.iter().map(OsString::from));
        args.push(patch_path.into_os_string());

        let rendered = args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        debug!(root = %root.display(), "git {rendered}");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(root)
            .env("LC_ALL", "C")
            .output()
            .map_err(Error::GitUnavailable)?;
        check_status(rendered, output)
    }
}

fn check_status(args: String, output: Output) -> Result<String> {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if output.status.success() {
        return Ok(stderr);
    }
    Err(Error::Git {
        args,
        stderr: if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        },
    })
}

/// `git apply --verbose` reports a hunk that landed away from its header as
/// `Hunk #1 succeeded at 5 (offset 3 lines).`
fn fit_from(stderr: &str) -> Fit {
    if stderr.lines().any(|line| line.contains("succeeded at") && line.contains("(offset")) {
        Fit::Shifted
    } else {
        Fit::Exact
    }
}

impl PatchEngine for GitEngine {
    fn name(&self) -> &'static str {
        "git"
    }

    fn check(&self, patch: &PatchFile, root: &Path) -> Result<Fit> {
        self.run(root, patch, &["--check", "--verbose"]).map(|stderr| fit_from(&stderr))
    }

    fn apply(&self, patch: &PatchFile, root: &Path) -> Result<()> {
        self.run(root, patch, &[]).map(|_| ())
    }

    fn check_reverse(&self, patch: &PatchFile, root: &Path) -> Result<Fit> {
        self.run(root, patch, &["--check", "--reverse", "--verbose"])
            .map(|stderr| fit_from(&stderr))
    }
}
