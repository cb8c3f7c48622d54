// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "EVENTVIEW_LOG";

/// Where log lines go. The terminal UI owns stdout, so interactive sessions
/// log to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    File,
    Stderr,
}

pub fn init(config: &Config, target: LogTarget) -> Result<()> {
    let directive = filter_directive(env::var(LOG_ENV).ok(), config.log_level());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter {directive:?}; check {LOG_ENV} or [log].level"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(io::stderr).try_init(),
        LogTarget::File => {
            let path = config.log_path()?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| {
                    format!(
                        "open log file {} -- set [log].file to a writable path",
                        path.display()
                    )
                })?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}

/// A non-blank environment override wins over the configured level.
fn filter_directive(env_value: Option<String>, configured: &str) -> String {
    match env_value {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured.to_owned(),
    }
}
