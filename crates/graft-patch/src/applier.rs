use crate::apply::Fit;
use crate::engine::{BuiltinEngine, PatchEngine};
use crate::{Error, PatchFile, Result};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// How a patch relates to the tree after (or instead of) applying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchStatus {
    /// The forward application succeeded and the tree was rewritten.
    Applied,
    /// Forward application fails but the reverse applies cleanly.
    AlreadyApplied,
    /// The forward check passes; nothing was written.
    Applicable,
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already-applied",
            Self::Applicable => "applicable",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApplyMode {
    #[default]
    Apply,
    /// Classify only. The tree is never written.
    Check,
}

/// Idempotent patch application: applied state is read off the tree with a
/// reverse check, never recorded anywhere.
pub struct PatchApplier {
    engine: Box<dyn PatchEngine>,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new(Box::new(BuiltinEngine))
    }
}

impl fmt::Debug for PatchApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchApplier")
            .field("engine", &self.engine.name())
            .finish()
    }
}

impl PatchApplier {
    pub fn new(engine: Box<dyn PatchEngine>) -> Self {
        Self { engine }
    }

    /// Load the patch at `path` and apply it under `root`.
    ///
    /// A missing patch file surfaces as [`Error::SourceMissing`].
    pub fn apply_path(
        &self,
        name: &str,
        path: &Path,
        root: &Path,
        mode: ApplyMode,
    ) -> Result<PatchStatus> {
        let patch = PatchFile::load(name, path)?;
        self.apply(&patch, root, mode)
    }

    /// Classify `patch` against `root`, applying it when `mode` allows.
    ///
    /// When neither direction applies the forward diagnostic is returned as
    /// [`Error::ApplyFailed`] and the tree is left as found.
    ///
    /// A forward match that only lands away from the stated lines loses to a
    /// reverse match at the stated lines: repeated context would otherwise let
    /// an applied patch apply a second time further down the file.
    pub fn apply(&self, patch: &PatchFile, root: &Path, mode: ApplyMode) -> Result<PatchStatus> {
        let forward = self.engine.check(patch, root);

        let forward_err = match forward {
            Ok(fit) => {
                if fit == Fit::Shifted && self.reverse_is_exact(patch, root) {
                    info!(patch = patch.name(), "patch already applied");
                    return Ok(PatchStatus::AlreadyApplied);
                }
                if mode == ApplyMode::Check {
                    debug!(patch = patch.name(), "patch applies cleanly");
                    return Ok(PatchStatus::Applicable);
                }
                match self.engine.apply(patch, root) {
                    Ok(()) => {
                        info!(patch = patch.name(), engine = self.engine.name(), "applied patch");
                        return Ok(PatchStatus::Applied);
                    }
                    Err(e) => e,
                }
            }
            Err(e) => e,
        };

        debug!(patch = patch.name(), error = %forward_err, "forward apply failed, trying reverse check");

        match self.engine.check_reverse(patch, root) {
            Ok(_) => {
                info!(patch = patch.name(), "patch already applied");
                Ok(PatchStatus::AlreadyApplied)
            }
            Err(reverse_err) => {
                debug!(patch = patch.name(), error = %reverse_err, "reverse check failed");
                Err(Error::ApplyFailed {
                    name: patch.name().to_string(),
                    diagnostic: forward_err.to_string(),
                })
            }
        }
    }

    fn reverse_is_exact(&self, patch: &PatchFile, root: &Path) -> bool {
        match self.engine.check_reverse(patch, root) {
            Ok(fit) => fit == Fit::Exact,
            Err(e) => {
                debug!(patch = patch.name(), error = %e, "forward match is shifted and reverse does not apply");
                false
            }
        }
    }
}
