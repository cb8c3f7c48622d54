// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use eventview_app::AppState;
use eventview_app::dates::{format_timestamp, parse_timestamp};
use eventview_store::RecordStore;
use eventview_testkit::{fixture_start, make_mock_events_from};
use logging::LogTarget;
use runtime::StoreRuntime;
use std::env;
use std::path::PathBuf;
use time::{OffsetDateTime, UtcOffset};
use tracing::{info, warn};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Resolve before any thread exists; the lookup is refused once the
    // process is multi-threaded.
    let local_offset = UtcOffset::current_local_offset();

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `eventview --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let log_target = if options.check_only {
        LogTarget::Stderr
    } else {
        LogTarget::File
    };
    logging::init(&config, log_target)?;

    let offset = match local_offset {
        Ok(offset) => offset,
        Err(error) => {
            warn!(%error, "local offset unavailable, showing times in UTC");
            UtcOffset::UTC
        }
    };
    let tui_options = config.tui_options(offset)?;

    let count = options.records.unwrap_or_else(|| config.demo_records());
    let days = options.days.unwrap_or_else(|| config.demo_days());
    let start = options.start.unwrap_or_else(fixture_start);
    let mut store = RecordStore::with_records(make_mock_events_from(count, days, start))
        .context("load demo records")?;
    info!(
        config = %options.config_path.display(),
        records = store.len(),
        days,
        start = %format_timestamp(start),
        %offset,
        "eventview starting"
    );
    if options.check_only {
        return Ok(());
    }

    let mut state = AppState::default();
    let mut runtime = StoreRuntime::new(&mut store);
    eventview_tui::run_app(&mut state, &mut runtime, tui_options)?;
    info!(records = store.len(), "eventview exiting");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    records: Option<usize>,
    days: Option<usize>,
    start: Option<OffsetDateTime>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        records: None,
        days: None,
        start: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--records" => {
                options.records = Some(parse_count("--records", iter.next())?);
            }
            "--days" => {
                let days = parse_count("--days", iter.next())?;
                if days == 0 {
                    return Err(anyhow::anyhow!(
                        "--days must be at least 1; mock events need a day window"
                    ));
                }
                options.days = Some(days);
            }
            "--start" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--start requires an RFC 3339 timestamp"))?;
                options.start = Some(parse_timestamp(value.as_ref()).context(
                    "--start expects an RFC 3339 timestamp such as 2026-01-01T00:00:00Z",
                )?);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn parse_count<S: AsRef<str>>(flag: &str, value: Option<S>) -> Result<usize> {
    let value = value.ok_or_else(|| anyhow::anyhow!("{flag} requires a number"))?;
    value
        .as_ref()
        .parse()
        .with_context(|| format!("{flag} expects a whole number, got {:?}", value.as_ref()))
}

fn print_help() {
    println!("eventview");
    println!("  --config <path>          Use a specific config path");
    println!("  --records <n>            Number of mock events to load");
    println!("  --days <n>               Spread mock events over this many days");
    println!("  --start <rfc3339>        First day of the mock event window");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and startup, logging to stderr");
    println!("  --help                   Show this help");
}
