// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Roving-focus movement over day buckets.
//!
//! Positions are plain indices into one grouping; they go stale as soon as
//! the buckets are regrouped, which is why lookups return `Option`.

use serde::{Deserialize, Serialize};

use crate::dates::time_label;
use crate::grouping::{DayBucket, TimelineItem};
use crate::ids::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub bucket_index: usize,
    pub item_index: usize,
}

impl Position {
    pub const fn new(bucket_index: usize, item_index: usize) -> Self {
        Self {
            bucket_index,
            item_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationModel {
    /// Up/down stay in the day; left/right jump days.
    #[default]
    CalendarGrid,
    /// Every arrow walks items in reading order.
    FlatList,
}

impl NavigationModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CalendarGrid => "calendar_grid",
            Self::FlatList => "flat_list",
        }
    }
}

pub fn find_position(buckets: &[DayBucket], id: &RecordId) -> Option<Position> {
    buckets
        .iter()
        .enumerate()
        .find_map(|(bucket_index, bucket)| {
            bucket
                .items
                .iter()
                .position(|item| &item.id == id)
                .map(|item_index| Position::new(bucket_index, item_index))
        })
}

pub fn item_at(buckets: &[DayBucket], position: Position) -> Option<&TimelineItem> {
    buckets
        .get(position.bucket_index)
        .and_then(|bucket| bucket.items.get(position.item_index))
}

pub fn next_position(
    buckets: &[DayBucket],
    position: Position,
    direction: NavDirection,
    model: NavigationModel,
) -> Option<Position> {
    item_at(buckets, position)?;
    match model {
        NavigationModel::CalendarGrid => calendar_step(buckets, position, direction),
        NavigationModel::FlatList => flat_step(buckets, position, direction),
    }
}

fn calendar_step(
    buckets: &[DayBucket],
    position: Position,
    direction: NavDirection,
) -> Option<Position> {
    let Position {
        bucket_index,
        item_index,
    } = position;
    match direction {
        NavDirection::Down => {
            let next = item_index + 1;
            (next < buckets[bucket_index].len()).then(|| Position::new(bucket_index, next))
        }
        NavDirection::Up => item_index
            .checked_sub(1)
            .map(|prev| Position::new(bucket_index, prev)),
        NavDirection::Right => jump_to_bucket(buckets, bucket_index + 1, item_index),
        NavDirection::Left => bucket_index
            .checked_sub(1)
            .and_then(|prev| jump_to_bucket(buckets, prev, item_index)),
    }
}

fn jump_to_bucket(buckets: &[DayBucket], target: usize, item_index: usize) -> Option<Position> {
    let last = buckets.get(target)?.len().checked_sub(1)?;
    Some(Position::new(target, item_index.min(last)))
}

fn flat_step(buckets: &[DayBucket], position: Position, direction: NavDirection) -> Option<Position> {
    let flat = buckets
        .iter()
        .enumerate()
        .flat_map(|(bucket_index, bucket)| {
            (0..bucket.len()).map(move |item_index| Position::new(bucket_index, item_index))
        })
        .collect::<Vec<_>>();
    let current = flat.iter().position(|candidate| *candidate == position)?;
    let target = match direction {
        NavDirection::Up | NavDirection::Left => current.checked_sub(1)?,
        NavDirection::Down | NavDirection::Right => current + 1,
    };
    flat.get(target).copied()
}

/// `"{day label} - {title}, {i} of {n}, {HH:MM}"`, or empty when the
/// position does not resolve.
pub fn announcement(buckets: &[DayBucket], position: Option<Position>) -> String {
    let Some(position) = position else {
        return String::new();
    };
    let Some(item) = item_at(buckets, position) else {
        return String::new();
    };
    let bucket = &buckets[position.bucket_index];
    format!(
        "{} - {}, {} of {}, {}",
        bucket.label,
        item.title,
        position.item_index + 1,
        bucket.len(),
        time_label(item.timestamp)
    )
}
