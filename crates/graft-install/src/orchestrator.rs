//! Sequencing a run: validate, patch, mount, report.

use crate::config::EngineKind;
use crate::mount::{self, MountState};
use crate::paths::{InstallationPaths, MountSpec, PatchSpec};
use crate::report::{DiscoveryReport, OperationKind, OperationResult, Outcome, RunReport};
use crate::validator;
use crate::{Error, Result};
use graft_manifest::{Discovery, DiscoveryOptions, discover};
use graft_patch::{
    ApplyMode, BuiltinEngine, GitEngine, PatchApplier, PatchEngine, PatchFile, PatchStatus,
    check_overlaps,
};
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Attempt every step regardless of earlier failures.
    #[default]
    Continue,
    /// After the first failure, report the remaining steps as skipped.
    FailFast,
}

/// Per-invocation switches.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub policy: FailurePolicy,
    pub skip_patches: bool,
    pub skip_mounts: bool,
    pub engine: EngineKind,
    /// Attach touched files and mount paths to each result.
    pub verbose: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn skip_patches(mut self, skip: bool) -> Self {
        self.skip_patches = skip;
        self
    }

    pub fn skip_mounts(mut self, skip: bool) -> Self {
        self.skip_mounts = skip;
        self
    }

    pub fn engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

enum Loaded {
    Ready(PatchFile),
    Broken(OperationResult),
}

pub struct Installer {
    paths: InstallationPaths,
    discovery: DiscoveryOptions,
}

impl Installer {
    pub fn new(paths: InstallationPaths, discovery: DiscoveryOptions) -> Self {
        Self { paths, discovery }
    }

    pub fn paths(&self) -> &InstallationPaths {
        &self.paths
    }

    /// Validate the host, then apply patches and establish mounts.
    ///
    /// `Err` means nothing was mutated: the host root is invalid, the patch
    /// set overlaps, or the chosen engine is unavailable. Every other failure
    /// is a [`Outcome::Failed`] entry in the report.
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        self.validate().await?;

        let mut report = RunReport::new(
            self.paths.host_root().to_path_buf(),
            self.paths.plugin_root().to_path_buf(),
            options.dry_run,
        );
        let mut failed = false;

        if !options.skip_patches {
            let applier = applier(options.engine)?;
            let loaded = self.load_patches()?;
            let mode = if options.dry_run {
                ApplyMode::Check
            } else {
                ApplyMode::Apply
            };

            for item in loaded {
                let result = match item {
                    _ if failed && options.policy == FailurePolicy::FailFast => {
                        skipped(OperationKind::Patch, item_name(&item))
                    }
                    Loaded::Broken(result) => result,
                    Loaded::Ready(patch) => self.apply_patch(&applier, &patch, mode, options),
                };
                failed |= !result.success();
                report.patches.push(result);
            }
        }

        if !options.skip_mounts {
            for spec in self.paths.mounts() {
                let result = if failed && options.policy == FailurePolicy::FailFast {
                    skipped(OperationKind::Mount, &spec.name)
                } else {
                    establish_mount(spec, options)
                };
                failed |= !result.success();
                report.mounts.push(result);
            }
        }

        let (patches, mounts) = (report.patch_counts(), report.mount_counts());
        info!(
            patches_applied = patches.applied,
            patches_already = patches.already_applied,
            patches_failed = patches.failed,
            mounts_established = mounts.applied,
            mounts_failed = mounts.failed,
            success = report.success(),
            "run finished"
        );
        Ok(report)
    }

    /// Read-only check of the host: patch state, mount state and discovery.
    pub async fn verify(&self, options: &RunOptions) -> Result<RunReport> {
        self.validate().await?;

        let mut report = RunReport::new(
            self.paths.host_root().to_path_buf(),
            self.paths.plugin_root().to_path_buf(),
            true,
        );

        let applier = applier(options.engine)?;
        for item in self.load_patches()? {
            let result = match item {
                Loaded::Broken(result) => result,
                Loaded::Ready(patch) => {
                    let result = self.apply_patch(&applier, &patch, ApplyMode::Check, options);
                    match result.outcome {
                        Outcome::Planned => OperationResult {
                            outcome: Outcome::Pending,
                            ..result
                        },
                        _ => result,
                    }
                }
            };
            report.patches.push(result);
        }

        for spec in self.paths.mounts() {
            let result = match mount::inspect(spec) {
                Ok(MountState::InPlace) => {
                    OperationResult::new(OperationKind::Mount, &spec.name, Outcome::AlreadyApplied)
                }
                Ok(MountState::Absent) => {
                    OperationResult::new(OperationKind::Mount, &spec.name, Outcome::Pending)
                        .with_detail("target does not exist")
                }
                Ok(MountState::Stale(reason)) => {
                    OperationResult::failed(OperationKind::Mount, &spec.name, reason)
                }
                Err(e) => OperationResult::failed(OperationKind::Mount, &spec.name, e),
            };
            report.mounts.push(with_mount_detail(result, spec, options));
        }

        report.discovery = Some(DiscoveryReport::from_result(
            self.paths.discovery_root().to_path_buf(),
            self.discover(),
        ));
        Ok(report)
    }

    pub fn discover(&self) -> graft_manifest::Result<Discovery> {
        discover(self.paths.discovery_root(), &self.discovery)
    }

    async fn validate(&self) -> Result<()> {
        let root = self.paths.host_root();
        let status = validator::probe_markers(root, self.paths.markers()).await;
        let missing: Vec<String> = status
            .into_iter()
            .filter(|m| !m.present)
            .map(|m| m.marker)
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidHost {
                root: root.to_path_buf(),
                missing,
            });
        }
        info!(root = %root.display(), "host root is valid");
        Ok(())
    }

    /// Load every patch, then reject the set if two patches overlap.
    fn load_patches(&self) -> Result<Vec<Loaded>> {
        let loaded: Vec<Loaded> = self.paths.patches().iter().map(load_patch).collect();

        let ready: Vec<PatchFile> = loaded
            .iter()
            .filter_map(|item| match item {
                Loaded::Ready(patch) => Some(patch.clone()),
                Loaded::Broken(_) => None,
            })
            .collect();
        check_overlaps(&ready)?;

        Ok(loaded)
    }

    fn apply_patch(
        &self,
        applier: &PatchApplier,
        patch: &PatchFile,
        mode: ApplyMode,
        options: &RunOptions,
    ) -> OperationResult {
        let result = match applier.apply(patch, self.paths.host_root(), mode) {
            Ok(PatchStatus::Applied) => {
                OperationResult::new(OperationKind::Patch, patch.name(), Outcome::Applied)
            }
            Ok(PatchStatus::AlreadyApplied) => {
                OperationResult::new(OperationKind::Patch, patch.name(), Outcome::AlreadyApplied)
            }
            Ok(PatchStatus::Applicable) => {
                OperationResult::new(OperationKind::Patch, patch.name(), Outcome::Planned)
            }
            Err(e) => {
                warn!(patch = patch.name(), error = %e, "patch failed");
                OperationResult::failed(OperationKind::Patch, patch.name(), e)
            }
        };

        if options.verbose {
            let files = self
                .paths
                .patch_targets(patch)
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            result.with_detail(files)
        } else {
            result
        }
    }
}

fn applier(engine: EngineKind) -> Result<PatchApplier> {
    let engine: Box<dyn PatchEngine> = match engine {
        EngineKind::Builtin => Box::new(BuiltinEngine),
        EngineKind::Git => {
            let git = GitEngine::new();
            git.ensure_available()?;
            Box::new(git)
        }
    };
    Ok(PatchApplier::new(engine))
}

fn load_patch(spec: &PatchSpec) -> Loaded {
    match PatchFile::load(&spec.name, &spec.file) {
        Ok(patch) => Loaded::Ready(patch),
        Err(e) => {
            warn!(patch = %spec.name, error = %e, "could not load patch");
            Loaded::Broken(OperationResult::failed(OperationKind::Patch, &spec.name, e))
        }
    }
}

fn item_name(item: &Loaded) -> &str {
    match item {
        Loaded::Ready(patch) => patch.name(),
        Loaded::Broken(result) => &result.name,
    }
}

fn skipped(kind: OperationKind, name: &str) -> OperationResult {
    OperationResult::new(kind, name, Outcome::Skipped).with_detail("skipped after earlier failure")
}

fn establish_mount(spec: &MountSpec, options: &RunOptions) -> OperationResult {
    let attempt = if options.dry_run {
        mount::plan(spec).map(|()| Outcome::Planned)
    } else {
        mount::establish(spec).map(|()| Outcome::Applied)
    };

    let result = match attempt {
        Ok(outcome) => OperationResult::new(OperationKind::Mount, &spec.name, outcome),
        Err(e) => {
            warn!(mount = %spec.name, error = %e, "mount failed");
            OperationResult::failed(OperationKind::Mount, &spec.name, e)
        }
    };
    with_mount_detail(result, spec, options)
}

fn with_mount_detail(result: OperationResult, spec: &MountSpec, options: &RunOptions) -> OperationResult {
    if !options.verbose || result.detail.is_some() {
        return result;
    }
    result.with_detail(format!(
        "{} -> {} ({})",
        spec.target.display(),
        spec.source.display(),
        spec.mode
    ))
}
