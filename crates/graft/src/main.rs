use anyhow::Context;
use clap::Parser;
use cli::{App, Commands, DiscoverArgs, RunArgs, TargetArgs};
use console::style;
use graft_install::{Config, EngineKind, InstallationPaths, Installer, RunOptions, RunReport};
use std::process::ExitCode;
use tracing::debug;

mod cli;
mod logging;
mod render;

/// Exit status for a run that could not start: bad config or host root.
const EXIT_SETUP: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let app = App::parse();
    logging::init(app.verbose);

    match run(app).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", style("error:").red().bold());
            ExitCode::from(EXIT_SETUP)
        }
    }
}

async fn run(app: App) -> anyhow::Result<ExitCode> {
    let verbose = app.verbose > 0;
    let report = match &app.cmd {
        Commands::Install(args) => install(args, verbose, Scope::All).await?,
        Commands::Patch(args) => install(args, verbose, Scope::Patches).await?,
        Commands::Mount(args) => install(args, verbose, Scope::Mounts).await?,
        Commands::Verify(args) => {
            let (installer, engine) = installer(args)?;
            let options = RunOptions::new().engine(engine).verbose(verbose);
            installer
                .verify(&options)
                .await
                .context("verification could not start")?
        }
        Commands::Discover(args) => return discover(args, app.json),
    };

    print_report(&report, app.json)?;
    Ok(ExitCode::from(report.exit_code() as u8))
}

#[derive(Clone, Copy)]
enum Scope {
    All,
    Patches,
    Mounts,
}

async fn install(args: &RunArgs, verbose: bool, scope: Scope) -> anyhow::Result<RunReport> {
    let (installer, engine) = installer(&args.target)?;
    let mut options = args.options(engine, verbose);
    match scope {
        Scope::All => {}
        Scope::Patches => options.skip_mounts = true,
        Scope::Mounts => options.skip_patches = true,
    }

    installer.run(&options).await.context("installation could not start")
}

fn installer(target: &TargetArgs) -> anyhow::Result<(Installer, EngineKind)> {
    let config = Config::discover(&target.plugin, target.config.as_deref())
        .context("failed to load configuration")?;
    let paths = InstallationPaths::resolve(&target.plugin, &target.host, &config, target.mode)
        .context("failed to resolve installation paths")?;
    let engine = target.engine.unwrap_or(config.patches.engine);
    debug!(
        host = %paths.host_root().display(),
        plugin = %paths.plugin_root().display(),
        patches = paths.patches().len(),
        mounts = paths.mounts().len(),
        %engine,
        "resolved installation"
    );
    Ok((Installer::new(paths, config.discovery.options()), engine))
}

fn discover(args: &DiscoverArgs, json: bool) -> anyhow::Result<ExitCode> {
    let config = Config::discover(&args.plugin, args.config.as_deref())
        .context("failed to load configuration")?;
    let root = args.plugin.join(&config.discovery.root);
    let discovery = graft_manifest::discover(&root, &config.discovery.options())
        .with_context(|| format!("discovery failed in {}", root.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
    } else {
        println!("{}", render::discovery(&discovery));
    }
    Ok(if discovery.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", render::run_report(report));
    }
    Ok(())
}
