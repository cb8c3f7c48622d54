// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use eventview_app::{
    DEFAULT_COLUMN_WIDTH, DEFAULT_MAX_WIDTH, DEFAULT_MIN_WIDTH, DEFAULT_PAGE_SIZE,
    DEFAULT_RESIZE_STEP, FilterMode, NavigationModel, SortDirection, WidthBounds,
};
use eventview_testkit::DEFAULT_DAYS_SPAN;
use eventview_tui::TuiOptions;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::UtcOffset;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "eventview";
pub const CONFIG_PATH_ENV: &str = "EVENTVIEW_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_STATUS_TIMEOUT: &str = "3s";
const DEFAULT_DEMO_RECORDS: usize = 200;
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_FILE_NAME: &str = "eventview.log";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub grid: Grid,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            grid: Grid::default(),
            timeline: Timeline::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Grid {
    pub page_size: Option<usize>,
    pub initial_page: Option<usize>,
    pub min_width: Option<u16>,
    pub max_width: Option<u16>,
    pub default_width: Option<u16>,
    pub resize_step: Option<u16>,
    pub filter_mode: Option<FilterMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Timeline {
    pub direction: Option<SortDirection>,
    pub navigation: Option<NavigationModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub status_timeout: Option<String>,
    pub demo_records: Option<usize>,
    pub demo_days: Option<usize>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            status_timeout: Some(DEFAULT_STATUS_TIMEOUT.to_owned()),
            demo_records: Some(DEFAULT_DEMO_RECORDS),
            demo_days: Some(DEFAULT_DAYS_SPAN),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` and keep values under [grid], [timeline], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.grid.page_size == Some(0) {
            bail!(
                "grid.page_size in {} must be positive, got 0",
                path.display()
            );
        }

        if self.grid.initial_page == Some(0) {
            bail!(
                "grid.initial_page in {} is 1-based, got 0",
                path.display()
            );
        }

        self.width_bounds().with_context(|| {
            format!(
                "invalid [grid] widths in {}; keep min_width <= default_width <= max_width",
                path.display()
            )
        })?;

        let timeout = self.status_timeout()?;
        if timeout.is_zero() {
            bail!(
                "ui.status_timeout in {} must be positive, got {:?}",
                path.display(),
                self.ui.status_timeout.as_deref().unwrap_or_default()
            );
        }

        if self.ui.demo_days == Some(0) {
            bail!(
                "ui.demo_days in {} must be positive, got 0",
                path.display()
            );
        }

        EnvFilter::try_new(self.log_level()).with_context(|| {
            format!(
                "log.level in {} is not a valid filter; use a level such as \"info\" or \"eventview_app=debug\"",
                path.display()
            )
        })?;

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.grid.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn initial_page(&self) -> usize {
        self.grid.initial_page.unwrap_or(1)
    }

    pub fn width_bounds(&self) -> Result<WidthBounds> {
        WidthBounds::new(
            self.grid.min_width.unwrap_or(DEFAULT_MIN_WIDTH),
            self.grid.max_width.unwrap_or(DEFAULT_MAX_WIDTH),
            self.grid.default_width.unwrap_or(DEFAULT_COLUMN_WIDTH),
            self.grid.resize_step.unwrap_or(DEFAULT_RESIZE_STEP),
        )
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.grid.filter_mode.unwrap_or_default()
    }

    pub fn timeline_direction(&self) -> SortDirection {
        self.timeline.direction.unwrap_or(SortDirection::Desc)
    }

    pub fn navigation(&self) -> NavigationModel {
        self.timeline.navigation.unwrap_or_default()
    }

    pub fn status_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .status_timeout
                .as_deref()
                .unwrap_or(DEFAULT_STATUS_TIMEOUT),
        )
    }

    pub fn demo_records(&self) -> usize {
        self.ui.demo_records.unwrap_or(DEFAULT_DEMO_RECORDS)
    }

    pub fn demo_days(&self) -> usize {
        self.ui.demo_days.unwrap_or(DEFAULT_DAYS_SPAN)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to an absolute path")
        })?;
        Ok(data_root.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn tui_options(&self, offset: UtcOffset) -> Result<TuiOptions> {
        Ok(TuiOptions {
            offset,
            page_size: self.page_size(),
            initial_page: self.initial_page(),
            width_bounds: self.width_bounds()?,
            filter_mode: self.filter_mode(),
            timeline_direction: self.timeline_direction(),
            navigation: self.navigation(),
            status_timeout: self.status_timeout()?,
        })
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# eventview config\n# Place this file at: {}\n\nversion = 1\n\n[grid]\npage_size = {}\n# 1-based; clamped to the last page on startup\ninitial_page = 1\nmin_width = {}\nmax_width = {}\ndefault_width = {}\nresize_step = {}\n# \"columns\" ANDs per-column filters; \"global\" searches every column\nfilter_mode = \"columns\"\n\n[timeline]\n# \"desc\" shows the newest day first\ndirection = \"desc\"\n# \"calendar_grid\" or \"flat_list\"\nnavigation = \"calendar_grid\"\n\n[ui]\nstatus_timeout = \"{}\"\ndemo_records = {}\ndemo_days = {}\n\n[log]\n# EVENTVIEW_LOG overrides this filter\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/eventview/eventview.log)\n# file = \"/absolute/path/to/eventview.log\"\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_MIN_WIDTH,
            DEFAULT_MAX_WIDTH,
            DEFAULT_COLUMN_WIDTH,
            DEFAULT_RESIZE_STEP,
            DEFAULT_STATUS_TIMEOUT,
            DEFAULT_DEMO_RECORDS,
            DEFAULT_DAYS_SPAN,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use <N>ms or <N>s (for example 1500ms or 3s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, parse_duration};
    use anyhow::Result;
    use eventview_app::{FilterMode, NavigationModel, SortDirection};
    use eventview_testkit::temp_config_path;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use time::UtcOffset;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let (temp, path) = temp_config_path()?;
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.initial_page(), 1);
        assert_eq!(config.filter_mode(), FilterMode::Columns);
        assert_eq!(config.timeline_direction(), SortDirection::Desc);
        assert_eq!(config.status_timeout()?, Duration::from_millis(3000));
        assert_eq!(config.demo_records(), 200);
        assert_eq!(config.demo_days(), 30);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[grid]\npage_size = 10\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[grid], [timeline], [ui], and [log]"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[grid]\npage_size = 10\ninitial_page = 3\nmin_width = 80\nmax_width = 400\ndefault_width = 160\nresize_step = 8\nfilter_mode = \"global\"\n[timeline]\ndirection = \"asc\"\nnavigation = \"flat_list\"\n[ui]\nstatus_timeout = \"1500ms\"\ndemo_records = 12\ndemo_days = 3\n[log]\nlevel = \"debug\"\nfile = \"/tmp/eventview-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        let options = config.tui_options(UtcOffset::UTC)?;
        assert_eq!(options.page_size, 10);
        assert_eq!(options.initial_page, 3);
        assert_eq!(options.width_bounds.min(), 80);
        assert_eq!(options.width_bounds.default_width(), 160);
        assert_eq!(options.width_bounds.step(), 8);
        assert_eq!(options.filter_mode, FilterMode::Global);
        assert_eq!(options.timeline_direction, SortDirection::Asc);
        assert_eq!(options.navigation, NavigationModel::FlatList);
        assert_eq!(options.status_timeout, Duration::from_millis(1500));
        assert_eq!(config.demo_records(), 12);
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/eventview-test.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn zero_page_size_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\npage_size = 0\n")?;
        let error = Config::load(&path).expect_err("zero page size should fail");
        assert!(error.to_string().contains("grid.page_size"));
        Ok(())
    }

    #[test]
    fn zero_initial_page_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\ninitial_page = 0\n")?;
        let error = Config::load(&path).expect_err("zero initial page should fail");
        assert!(error.to_string().contains("grid.initial_page"));
        Ok(())
    }

    #[test]
    fn inconsistent_width_bounds_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\nmin_width = 300\nmax_width = 200\n")?;
        let error = Config::load(&path).expect_err("min above max should fail");
        let message = format!("{error:#}");
        assert!(message.contains("invalid [grid] widths"));
        assert!(message.contains("minimum column width 300 exceeds maximum 200"));
        Ok(())
    }

    #[test]
    fn unknown_filter_mode_fails_to_decode() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[grid]\nfilter_mode = \"fuzzy\"\n")?;
        let error = Config::load(&path).expect_err("unknown mode should fail");
        assert!(error.to_string().contains("decode config"));
        Ok(())
    }

    #[test]
    fn bad_status_timeout_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nstatus_timeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("ui.status_timeout"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips() -> Result<()> {
        let (_temp, path) = write_config("")?;
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert_eq!(config.page_size(), 25);
        assert_eq!(config.initial_page(), 1);
        assert_eq!(config.navigation(), NavigationModel::CalendarGrid);
        Ok(())
    }

    #[test]
    fn parse_duration_accepts_supported_units() -> Result<()> {
        assert_eq!(parse_duration("250ms")?, Duration::from_millis(250));
        assert_eq!(parse_duration("3s")?, Duration::from_secs(3));
        assert!(parse_duration("3h").is_err());
        assert!(parse_duration("soon").is_err());
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("eventview/config.toml"));
        Ok(())
    }
}
