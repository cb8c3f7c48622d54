// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339)
        .with_context(|| format!("invalid ISO-8601 timestamp {raw:?}"))
}

pub fn format_timestamp(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).expect("rfc3339 format is valid")
}

/// Calendar date of `value` as seen from `offset`.
pub fn local_date(value: OffsetDateTime, offset: UtcOffset) -> Date {
    value.to_offset(offset).date()
}

pub fn day_key(date: Date) -> String {
    date.format(&format_description!("[year]-[month]-[day]"))
        .expect("day key format is valid")
}

pub fn day_label(date: Date) -> String {
    date.format(&format_description!(
        "[month repr:short] [day padding:none], [year]"
    ))
    .expect("day label format is valid")
}

pub fn time_label(value: OffsetDateTime) -> String {
    value
        .format(&format_description!("[hour]:[minute]"))
        .expect("time label format is valid")
}

pub fn datetime_label(value: OffsetDateTime, offset: UtcOffset) -> String {
    value
        .to_offset(offset)
        .format(&format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .expect("datetime label format is valid")
}

pub fn datetime_input_value(value: OffsetDateTime, offset: UtcOffset) -> String {
    value
        .to_offset(offset)
        .format(&format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .expect("datetime input format is valid")
}

/// Accepts the `YYYY-MM-DDTHH:MM` shape of a local datetime input, or a full
/// RFC 3339 timestamp. Local values are interpreted at `offset`.
pub fn parse_datetime_input(input: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(local) = PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ) {
        return Some(local.assume_offset(offset));
    }
    parse_timestamp(trimmed).ok()
}
