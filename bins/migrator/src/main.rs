//! Migration helper CLI for Tidemark.
//!
//! Usage:
//!   tidemark init                           - Write a starter config/default.toml
//!   tidemark status [--seed] [--url <URL>]  - Show applied and pending scripts
//!   tidemark check [--seed] [--url <URL>]   - Report the tracking-table layout
//!   tidemark upgrade-meta [--url <URL>]     - Add timestamp columns to a legacy tracking table
//!
//! A URL supplied with `--url` takes precedence over the config file; without
//! either, commands that touch the database fail with exit code 1.

use std::process::ExitCode;

use tidemark_db::{
    MetaShape, MigratorError, Runner, RunnerArgs, RunnerKind, add_timestamps, build_runner,
    ensure_current_meta_schema,
};
use tidemark_shared::MigratorConfig;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: tidemark <init|status|check|upgrade-meta> [--seed] [--url <URL>]";

const STARTER_CONFIG: &str = r#"# Tidemark configuration.

[database]
url = "postgres://localhost:5432/app_development"
# Uncomment to keep the tracking table in a non-default schema (Postgres).
# schema = "public"

[storage]
table_name = "SequelizeMeta"
column_name = "name"
seed_table_name = "SequelizeData"

[paths]
migrations = "migrations"
seeders = "seeders"
"#;

/// Parsed command line.
struct Cli {
    command: String,
    url: Option<String>,
    seed: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Option<Cli> {
    let command = args.next()?;
    let mut url = None;
    let mut seed = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => url = Some(args.next()?),
            "--seed" => seed = true,
            _ => return None,
        }
    }

    Some(Cli { command, url, seed })
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(cli) = parse_args(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ MigratorError::MissingConfig(_)) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<(), MigratorError> {
    let kind = if cli.seed {
        RunnerKind::Seed
    } else {
        RunnerKind::Migration
    };
    let args = RunnerArgs {
        url: cli.url.clone(),
    };

    match cli.command.as_str() {
        "init" => init_config(),
        "status" => {
            let mut runner = build_runner(kind, &args).await?;
            status(&mut runner).await
        }
        "check" => {
            let mut runner = build_runner(kind, &args).await?;
            let shape = ensure_current_meta_schema(&mut runner).await?;
            let label = match shape {
                MetaShape::Legacy => "legacy (name column only)",
                MetaShape::Current => "current (timestamps enabled)",
                MetaShape::Undetermined => "undetermined (left untouched)",
            };
            println!("Tracking table \"{}\": {label}", runner.storage().table());
            Ok(())
        }
        "upgrade-meta" => {
            let mut runner = build_runner(kind, &args).await?;
            add_timestamps(&mut runner).await?;
            println!(
                "Tracking table \"{}\" is on the current layout",
                runner.storage().table()
            );
            Ok(())
        }
        _ => {
            eprintln!("{USAGE}");
            Ok(())
        }
    }
}

async fn status(runner: &mut Runner) -> Result<(), MigratorError> {
    match ensure_current_meta_schema(runner).await {
        Ok(_) => {
            let applied = runner.applied().await?;
            let pending = runner.pending().await?;

            println!("Applied ({}):", applied.len());
            for name in &applied {
                println!("  {name}");
            }
            println!("Pending ({}):", pending.len());
            for name in &pending {
                println!("  {name}");
            }
            Ok(())
        }
        // No tracking table yet: everything discovered is pending.
        Err(MigratorError::MissingTrackingTable(table)) => {
            println!("No tracking table \"{table}\" found; nothing applied yet");
            let pending = runner.discovery().discover()?;
            println!("Pending ({}):", pending.len());
            for name in &pending {
                println!("  {name}");
            }
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn init_config() -> Result<(), MigratorError> {
    if MigratorConfig::file_exists() {
        println!(
            "\"{}\" already exists, leaving it in place",
            MigratorConfig::config_file().display()
        );
        return Ok(());
    }

    std::fs::create_dir_all("config")?;
    std::fs::write(MigratorConfig::config_file(), STARTER_CONFIG)?;
    println!("Wrote {}", MigratorConfig::config_file().display());
    Ok(())
}
