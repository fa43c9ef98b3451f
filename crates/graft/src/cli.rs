use clap::{ArgAction, Args, Parser, Subcommand};
use graft_install::{EngineKind, FailurePolicy, MountMode, RunOptions};
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(name = "graft", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// -v for debug logs, -vv for trace. RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print the report as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Validate the host, apply patches and establish mounts.
    #[command(alias = "i", name = "install")]
    Install(RunArgs),
    /// Validate the host and apply patches only.
    #[command(alias = "p", name = "patch")]
    Patch(RunArgs),
    /// Validate the host and establish mounts only.
    #[command(alias = "m", name = "mount")]
    Mount(RunArgs),
    /// Report patch, mount and manifest state without writing anything.
    #[command(alias = "v", name = "verify")]
    Verify(TargetArgs),
    /// List the node types declared by plugin manifests.
    #[command(alias = "d", name = "discover")]
    Discover(DiscoverArgs),
}

#[derive(Clone, Debug, Args)]
pub struct TargetArgs {
    /// Host source tree to install into.
    #[arg(long)]
    pub host: PathBuf,

    /// Plugin package root.
    #[arg(long, default_value = ".")]
    pub plugin: PathBuf,

    /// Config file; defaults to graft.toml in the plugin root.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override every configured mount mode.
    #[arg(long, value_name = "link|copy")]
    pub mode: Option<MountMode>,

    /// Patch engine; defaults to the configured one.
    #[arg(long, value_name = "builtin|git")]
    pub engine: Option<EngineKind>,
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    #[arg(long)]
    pub skip_patches: bool,

    /// Check every step without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the remaining steps after the first failure.
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Clone, Debug, Args)]
pub struct DiscoverArgs {
    #[arg(long, default_value = ".")]
    pub plugin: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    pub fn options(&self, engine: EngineKind, verbose: bool) -> RunOptions {
        RunOptions::new()
            .dry_run(self.dry_run)
            .skip_patches(self.skip_patches)
            .policy(if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Continue
            })
            .engine(engine)
            .verbose(verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_install() {
        let app = App::try_parse_from([
            "graft", "install", "--host", "../dify", "--mode", "copy", "--dry-run", "-vv",
        ])
        .unwrap();
        assert_eq!(app.verbose, 2);
        let Commands::Install(args) = app.cmd else {
            panic!("expected install");
        };
        assert_eq!(args.target.host, PathBuf::from("../dify"));
        assert_eq!(args.target.plugin, PathBuf::from("."));
        assert_eq!(args.target.mode, Some(MountMode::Copy));
        assert!(args.dry_run);
        assert!(!args.fail_fast);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(App::try_parse_from(["graft", "mount", "--host", "h", "--mode", "hardlink"]).is_err());
    }

    #[test]
    fn test_engine_flag() {
        let app = App::try_parse_from(["graft", "verify", "--host", "h", "--engine", "git", "--json"]).unwrap();
        assert!(app.json);
        let Commands::Verify(args) = app.cmd else {
            panic!("expected verify");
        };
        assert_eq!(args.engine, Some(EngineKind::Git));
    }

    #[test]
    fn test_options_from_flags() {
        let app = App::try_parse_from(["graft", "patch", "--host", "h", "--fail-fast"]).unwrap();
        let Commands::Patch(args) = app.cmd else {
            panic!("expected patch");
        };
        let options = args.options(EngineKind::Builtin, false);
        assert_eq!(options.policy, FailurePolicy::FailFast);
        assert!(!options.dry_run);
    }
}
