//! confagg
//!
//! Builds an aggregator from settings, environment and flags, then prints the
//! merged configuration, a single value, or the list of sources.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use confagg::cli::{Cli, Command, DumpArgs, DumpFormat};
use confagg::{Aggregator, FailurePolicy, Settings, Value};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)
                .with_context(|| format!("failed to open log file {}", filename))?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn render(value: &impl serde::Serialize, format: DumpFormat, compact: bool) -> Result<String> {
    Ok(match format {
        DumpFormat::Json if compact => serde_json::to_string(value)?,
        DumpFormat::Json => serde_json::to_string_pretty(value)?,
        DumpFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    // Settings file and environment first, flags on top
    let mut settings = Settings::discover(cli.settings.as_deref())?;
    settings.targets.extend(cli.targets.iter().cloned());
    settings.disabled_extensions.extend(cli.disabled.iter().cloned());
    if cli.skip_invalid {
        settings.failure_policy = FailurePolicy::Skip;
    }
    debug!(?settings, "Resolved settings");

    match cli.command {
        Some(Command::Sources) => {
            let aggregator = Aggregator::configure(&settings);
            for source in aggregator.sources()? {
                println!("{}\t{}\t{}", source.origin, source.extension, source.path.display());
            }
        }
        Some(Command::Get(args)) => {
            let aggregator = Aggregator::from_settings(&settings)?;
            let value: &Value = aggregator
                .lookup(&args.key)
                .ok_or_else(|| anyhow!("key not found: {}", args.key))?;
            println!("{}", render(value, args.format, false)?.trim_end());
        }
        Some(Command::Dump(args)) => dump(&settings, &args)?,
        None => dump(&settings, &DumpArgs::default())?,
    }

    Ok(())
}

fn dump(settings: &Settings, args: &DumpArgs) -> Result<()> {
    let aggregator = Aggregator::from_settings(settings)?;
    println!("{}", render(aggregator.store(), args.format, args.compact)?.trim_end());
    Ok(())
}
