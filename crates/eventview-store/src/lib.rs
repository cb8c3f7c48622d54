// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use eventview_app::{Record, RecordDraft, RecordId};
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Canonical in-memory record collection plus the current selection.
///
/// Newest creations sit at the front. Ids are unique for the lifetime of the
/// store.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    selected_id: Option<RecordId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert(&record.id) {
                bail!(
                    "duplicate record id {} -- give every record a unique id and retry",
                    record.id
                );
            }
        }
        info!(count = records.len(), "record store loaded");
        Ok(Self {
            records,
            selected_id: None,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn create(&mut self, draft: RecordDraft) -> Result<RecordId> {
        draft.validate().context("create record")?;
        let id = self.fresh_id();
        self.records
            .insert(0, Record::from_draft(id.clone(), draft));
        debug!(id = %id, total = self.records.len(), "record created");
        Ok(id)
    }

    /// Replaces the mutable fields in place. `Ok(false)` means no record has
    /// that id.
    pub fn update(&mut self, id: &RecordId, draft: RecordDraft) -> Result<bool> {
        draft
            .validate()
            .with_context(|| format!("update record {id}"))?;
        let Some(record) = self.records.iter_mut().find(|record| &record.id == id) else {
            debug!(id = %id, "update skipped, record not found");
            return Ok(false);
        };
        record.apply(draft);
        debug!(id = %id, "record updated");
        Ok(true)
    }

    pub fn select(&mut self, id: Option<RecordId>) {
        debug!(id = ?id.as_ref().map(RecordId::as_str), "selection changed");
        self.selected_id = id;
    }

    pub fn selected_id(&self) -> Option<&RecordId> {
        self.selected_id.as_ref()
    }

    /// `None` when nothing is selected or the selected id no longer exists.
    pub fn selected(&self) -> Option<&Record> {
        self.selected_id.as_ref().and_then(|id| self.get(id))
    }

    fn fresh_id(&self) -> RecordId {
        loop {
            let id = RecordId::new(Uuid::new_v4().to_string());
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}
