mod activate;
mod alias;
mod cli;
mod config;
mod download;
mod driver;
mod error;
mod hook;
mod manifest;
mod types;
mod version;


use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use config::{get_setting, load_settings, render_settings};
use download::{parse_link_spec, unpack, UnpackOptions, UnpackOutcome};
use driver::{tool_name, Driver};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use types::{BatchReport, InstallConfig, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let debug = settings.debug || matches!(cli.command, Commands::Install { debug: true, .. });
    setup_logging(&cli, debug);

    match run(cli, settings).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut settings: Settings) -> Result<ExitCode> {
    match cli.command {
        Commands::Version => {
            println!("toolshelf v{}", env!("CARGO_PKG_VERSION"));
        }

        Commands::Install {
            tool_dirs,
            debug,
            strict,
            report,
        } => {
            settings.debug |= debug;
            settings.strict |= strict;
            let config = InstallConfig {
                tool_directories: tool_dirs,
                settings,
            };
            let strict = config.settings.strict;

            let batch = Driver::new(config).run();
            if let Some(path) = report {
                write_report(&batch, &path)?;
            }

            if strict && !batch.is_clean() {
                tracing::error!("Strict mode: not every tool completed");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Link {
            tool_dir,
            version,
            latest,
        } => {
            if let Some(version) = version {
                if !tool_dir.join(&version).exists() {
                    return Err(anyhow!(
                        "{} is not installed in {}",
                        version,
                        tool_dir.display()
                    ));
                }
                for link in alias::link_aliases(&tool_dir, &version)? {
                    tracing::info!("Linked {} -> {}", link.alias, link.target);
                }
            }
            if latest {
                let versions = alias::concrete_versions(&tool_dir)
                    .with_context(|| format!("Could not scan {}", tool_dir.display()))?;
                alias::select_latest(&tool_dir, &versions)?;
            }
        }

        Commands::Unpack {
            version,
            location,
            dest,
            force,
            prune,
            link,
        } => {
            let dest = match dest {
                Some(dest) => dest,
                None => std::env::current_dir()?,
            };
            let links = link
                .iter()
                .map(|spec| parse_link_spec(spec))
                .collect::<Result<Vec<_>>>()?;
            let options = UnpackOptions {
                dest,
                force,
                prune,
                links,
            };
            match unpack(&version, &location, &options).await? {
                UnpackOutcome::Installed(path) | UnpackOutcome::AlreadyPresent(path) => {
                    tracing::debug!("Version directory: {}", path.display());
                }
            }
        }

        Commands::Resolve { tool_dir, version } => {
            let name = tool_name(&fs::canonicalize(&tool_dir).unwrap_or_else(|_| tool_dir.clone()));
            let requested =
                activate::requested_version(&name, version.as_deref(), |k| std::env::var(k).ok());
            let path = activate::resolve(&tool_dir, &requested)?;
            println!("{}", path.display());
        }

        Commands::List { tool_dir } => {
            list_tool(&tool_dir)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Get { key } => {
                println!("{}", get_setting(&settings, &key)?);
            }
            ConfigAction::Show { format } => {
                print!("{}", render_settings(&settings, &format)?);
                if format == "json" {
                    println!();
                }
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn setup_logging(cli: &Cli, debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if debug || cli.verbose >= 2 {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}

fn write_report(report: &BatchReport, path: &Path) -> Result<()> {
    let yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let content = if yaml {
        serde_yaml::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
        .with_context(|| format!("Could not write report to {}", path.display()))?;
    tracing::info!("Wrote run report to {}", path.display());
    Ok(())
}

fn list_tool(tool_dir: &Path) -> Result<()> {
    let versions = alias::concrete_versions(tool_dir)
        .with_context(|| format!("Could not read {}", tool_dir.display()))?;
    let aliases = alias::list_aliases(tool_dir)?;

    println!("--- {} ---", tool_name(tool_dir));
    if versions.is_empty() {
        println!("  No versions installed yet.");
    }
    for version in &versions {
        println!("  {}", version);
    }
    for link in &aliases {
        println!("  {} -> {}", link.alias, link.target);
    }
    Ok(())
}
