// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use eventview_app::{Record, RecordId, Severity};
use std::path::PathBuf;
use time::{Date, Duration, Month, OffsetDateTime, Time};

const TITLES: [&str; 6] = [
    "Door Forced Open",
    "Badge Access Denied",
    "Camera Offline",
    "Tamper Alert",
    "Motion Detected",
    "System Health Check",
];

const DESCRIPTIONS: [&str; 3] = [
    "Investigate at nearest control station.",
    "Operator acknowledgement recommended.",
    "Auto-escalated by monitoring profile.",
];

const SEVERITY_CYCLE: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

pub const DEFAULT_DAYS_SPAN: usize = 30;

/// 32-bit LCG; each draw is a unit float in `[0, 1)`.
#[derive(Debug, Clone)]
struct SeededRng {
    state: u32,
}

impl SeededRng {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_unit(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(1_664_525)
            .wrapping_add(1_013_904_223);
        f64::from(self.state) / 4_294_967_296.0
    }

    fn below(&mut self, n: u32) -> i64 {
        (self.next_unit() * f64::from(n)) as i64
    }
}

/// Deterministic mock events spread over a window of days.
///
/// The same `(count, days_span)` pair always produces the same records, so
/// tests can assert on concrete titles and timestamps.
#[derive(Debug, Clone)]
pub struct EventFaker {
    rng: SeededRng,
    start: OffsetDateTime,
    days_span: usize,
}

impl EventFaker {
    pub fn new(count: usize, days_span: usize) -> Self {
        let days_span = days_span.max(1);
        let seed = (count as u32)
            .wrapping_mul(31)
            .wrapping_add((days_span as u32).wrapping_mul(17));
        Self::with_seed(seed, days_span)
    }

    pub fn with_seed(seed: u32, days_span: usize) -> Self {
        Self {
            rng: SeededRng::new(seed),
            start: fixture_start(),
            days_span: days_span.max(1),
        }
    }

    pub fn starting_at(mut self, start: OffsetDateTime) -> Self {
        self.start = start;
        self
    }

    /// The `index`-th event. Call in index order: each call advances the
    /// generator by three draws.
    pub fn event(&mut self, index: usize) -> Record {
        let day_offset = (index % self.days_span) as i64;
        let hour = self.rng.below(24);
        let minute = self.rng.below(60);
        let second = self.rng.below(60);
        let timestamp = self.start
            + Duration::days(day_offset)
            + Duration::hours(hour)
            + Duration::minutes(minute)
            + Duration::seconds(second);

        Record {
            id: RecordId::new(format!("evt-{}", index + 1)),
            title: TITLES[index % TITLES.len()].to_owned(),
            timestamp,
            description: Some(DESCRIPTIONS[index % DESCRIPTIONS.len()].to_owned()),
            severity: Some(SEVERITY_CYCLE[index % SEVERITY_CYCLE.len()]),
        }
    }
}

pub fn make_mock_events(count: usize, days_span: usize) -> Vec<Record> {
    make_mock_events_from(count, days_span, fixture_start())
}

/// Same sequence as [`make_mock_events`], with the day window opening at
/// `start` instead of the fixture date.
pub fn make_mock_events_from(
    count: usize,
    days_span: usize,
    start: OffsetDateTime,
) -> Vec<Record> {
    let mut faker = EventFaker::new(count, days_span).starting_at(start);
    (0..count).map(|index| faker.event(index)).collect()
}

pub fn record(id: &str, title: &str, timestamp: OffsetDateTime) -> Record {
    Record {
        id: RecordId::new(id),
        title: title.to_owned(),
        timestamp,
        description: None,
        severity: None,
    }
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_start() -> OffsetDateTime {
    midnight_utc(2026, Month::January, 1)
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).expect("valid calendar date");
    date.with_time(Time::MIDNIGHT).assume_utc()
}
