// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::grid::Grid;

pub const DEFAULT_MIN_WIDTH: u16 = 120;
pub const DEFAULT_MAX_WIDTH: u16 = 640;
pub const DEFAULT_COLUMN_WIDTH: u16 = 180;
pub const DEFAULT_RESIZE_STEP: u16 = 16;

/// Column width contract, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthBounds {
    min: u16,
    max: u16,
    default: u16,
    step: u16,
}

impl Default for WidthBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_WIDTH,
            max: DEFAULT_MAX_WIDTH,
            default: DEFAULT_COLUMN_WIDTH,
            step: DEFAULT_RESIZE_STEP,
        }
    }
}

impl WidthBounds {
    pub fn new(min: u16, max: u16, default: u16, step: u16) -> Result<Self> {
        if min == 0 {
            bail!("minimum column width must be positive");
        }
        if min > max {
            bail!("minimum column width {min} exceeds maximum {max}");
        }
        if !(min..=max).contains(&default) {
            bail!("default column width {default} must lie within {min}..={max}");
        }
        if step == 0 {
            bail!("resize step must be positive");
        }
        Ok(Self {
            min,
            max,
            default,
            step,
        })
    }

    pub const fn min(self) -> u16 {
        self.min
    }

    pub const fn max(self) -> u16 {
        self.max
    }

    pub const fn default_width(self) -> u16 {
        self.default
    }

    pub const fn step(self) -> u16 {
        self.step
    }

    pub fn clamp(self, width: i32) -> u16 {
        let clamped = width.clamp(i32::from(self.min), i32::from(self.max));
        u16::try_from(clamped).unwrap_or(self.max)
    }

    pub fn resized(self, current: Option<u16>, delta: i32) -> u16 {
        let base = i32::from(current.unwrap_or(self.default));
        self.clamp(base.saturating_add(delta))
    }

    pub fn dragged(self, anchor_width: u16, anchor_x: i32, x: i32) -> u16 {
        self.clamp(i32::from(anchor_width).saturating_add(x.saturating_sub(anchor_x)))
    }
}

/// Pointer resize lifecycle: `Idle -> Dragging -> Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        column_id: String,
        anchor_x: i32,
        anchor_width: u16,
    },
}

impl DragState {
    pub fn column_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Dragging { column_id, .. } => Some(column_id),
        }
    }
}

/// Scoped drag. The session ends when the guard drops, however the caller
/// exits.
pub struct ResizeSession<'g, T> {
    grid: &'g mut Grid<T>,
}

impl<'g, T> ResizeSession<'g, T> {
    pub(crate) fn new(grid: &'g mut Grid<T>) -> Self {
        Self { grid }
    }

    pub fn drag_to(&mut self, x: i32) -> Option<u16> {
        self.grid.drag_resize(x)
    }

    pub fn column_id(&self) -> Option<&str> {
        self.grid.state().drag.column_id()
    }

    /// Restores the width captured at the start of the drag.
    pub fn cancel(self) {
        self.grid.finish_resize(true);
    }
}

impl<T> Drop for ResizeSession<'_, T> {
    fn drop(&mut self) {
        self.grid.finish_resize(false);
    }
}
