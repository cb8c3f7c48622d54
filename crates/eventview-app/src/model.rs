// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Ordinal used for sorting; higher is more severe.
    pub const fn rank(self) -> i64 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Steps through `None -> Low -> Medium -> High -> None`.
    pub const fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Low),
            Some(Self::Low) => Some(Self::Medium),
            Some(Self::Medium) => Some(Self::High),
            Some(Self::High) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub timestamp: OffsetDateTime,
    pub description: Option<String>,
    pub severity: Option<Severity>,
}

impl Record {
    pub fn from_draft(id: RecordId, draft: RecordDraft) -> Self {
        Self {
            id,
            title: draft.title,
            timestamp: draft.timestamp,
            description: draft.description,
            severity: draft.severity,
        }
    }

    pub fn apply(&mut self, draft: RecordDraft) {
        self.title = draft.title;
        self.timestamp = draft.timestamp;
        self.description = draft.description;
        self.severity = draft.severity;
    }

    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            title: self.title.clone(),
            timestamp: self.timestamp,
            description: self.description.clone(),
            severity: self.severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub title: String,
    pub timestamp: OffsetDateTime,
    pub description: Option<String>,
    pub severity: Option<Severity>,
}

impl RecordDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("event title is required -- enter a title and retry");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Grid,
    Timeline,
}

impl ViewKind {
    pub const ALL: [Self; 2] = [Self::Grid, Self::Timeline];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Timeline => "timeline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Browse,
    Form(FormMode),
}
