use graft_manifest::{Discovery, Rejected};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Patch,
    Mount,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Patch => "patch",
            Self::Mount => "mount",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    /// Newly applied patch or newly established mount.
    Applied,
    AlreadyApplied,
    /// Would be applied; reported by dry runs.
    Planned,
    /// Not in place; reported by verification.
    Pending,
    /// Not attempted because an earlier step failed.
    Skipped,
    Failed,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Pending)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Applied => "applied",
            Self::AlreadyApplied => "already-applied",
            Self::Planned => "planned",
            Self::Pending => "pending",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        })
    }
}

/// The result of one patch or mount. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub kind: OperationKind,
    pub name: String,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    pub fn new(kind: OperationKind, name: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            kind,
            name: name.into(),
            outcome,
            detail: None,
            error: None,
        }
    }

    pub fn failed(kind: OperationKind, name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(kind, name, Outcome::Failed)
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn success(&self) -> bool {
        !self.outcome.is_failure()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub applied: usize,
    pub already_applied: usize,
    pub planned: usize,
    pub pending: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Counts {
    pub fn tally<'a>(results: impl IntoIterator<Item = &'a OperationResult>) -> Self {
        let mut counts = Self::default();
        for result in results {
            let slot = match result.outcome {
                Outcome::Applied => &mut counts.applied,
                Outcome::AlreadyApplied => &mut counts.already_applied,
                Outcome::Planned => &mut counts.planned,
                Outcome::Pending => &mut counts.pending,
                Outcome::Skipped => &mut counts.skipped,
                Outcome::Failed => &mut counts.failed,
            };
            *slot += 1;
        }
        counts
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DiscoveryReport {
    pub root: PathBuf,
    pub node_types: Vec<String>,
    pub rejected: Vec<Rejected>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscoveryReport {
    pub fn from_result(root: PathBuf, result: graft_manifest::Result<Discovery>) -> Self {
        match result {
            Ok(discovery) => Self {
                root,
                node_types: discovery.registry.node_types().map(str::to_string).collect(),
                rejected: discovery.rejected,
                error: None,
            },
            Err(e) => Self {
                root,
                error: Some(e.to_string()),
                ..Self::default()
            },
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none() && self.rejected.is_empty()
    }
}

/// Everything a run did, in declaration order.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub host_root: PathBuf,
    pub plugin_root: PathBuf,
    pub dry_run: bool,
    pub patches: Vec<OperationResult>,
    pub mounts: Vec<OperationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryReport>,
}

impl RunReport {
    pub fn new(host_root: PathBuf, plugin_root: PathBuf, dry_run: bool) -> Self {
        Self {
            host_root,
            plugin_root,
            dry_run,
            patches: Vec::new(),
            mounts: Vec::new(),
            discovery: None,
        }
    }

    pub fn results(&self) -> impl Iterator<Item = &OperationResult> {
        self.patches.iter().chain(&self.mounts)
    }

    pub fn patch_counts(&self) -> Counts {
        Counts::tally(&self.patches)
    }

    pub fn mount_counts(&self) -> Counts {
        Counts::tally(&self.mounts)
    }

    /// The conjunction of every step.
    pub fn success(&self) -> bool {
        self.results().all(OperationResult::success)
            && self.discovery.as_ref().is_none_or(DiscoveryReport::success)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: &[Outcome]) -> RunReport {
        let mut report = RunReport::new("/host".into(), "/plugin".into(), false);
        for (i, outcome) in outcomes.iter().enumerate() {
            report
                .patches
                .push(OperationResult::new(OperationKind::Patch, format!("p{i}"), *outcome));
        }
        report
    }

    #[test]
    fn test_success_is_conjunction() {
        assert!(report(&[Outcome::Applied, Outcome::AlreadyApplied, Outcome::Planned]).success());
        assert!(!report(&[Outcome::Applied, Outcome::Failed]).success());
        assert!(!report(&[Outcome::Pending]).success());
        assert_eq!(report(&[]).exit_code(), 0);
        assert_eq!(report(&[Outcome::Failed]).exit_code(), 1);
    }

    #[test]
    fn test_discovery_failure_fails_report() {
        let mut r = report(&[Outcome::Applied]);
        r.discovery = Some(DiscoveryReport {
            error: Some("duplicate".into()),
            ..DiscoveryReport::default()
        });
        assert!(!r.success());
    }

    #[test]
    fn test_counts() {
        let r = report(&[Outcome::Applied, Outcome::Applied, Outcome::Failed, Outcome::Skipped]);
        let counts = r.patch_counts();
        assert_eq!(counts.applied, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(r.mount_counts(), Counts::default());
    }

    #[test]
    fn test_failed_result_keeps_error() {
        let result = OperationResult::failed(OperationKind::Mount, "nodes", "boom");
        assert_eq!(result.outcome, Outcome::Failed);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(!result.success());
    }
}
