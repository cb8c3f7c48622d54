// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use eventview_app::{Record, RecordDraft, RecordId};
use eventview_store::RecordStore;

pub struct StoreRuntime<'a> {
    store: &'a mut RecordStore,
}

impl<'a> StoreRuntime<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }
}

impl eventview_tui::AppRuntime for StoreRuntime<'_> {
    fn records(&self) -> &[Record] {
        self.store.records()
    }

    fn create_record(&mut self, draft: RecordDraft) -> Result<RecordId> {
        self.store.create(draft)
    }

    fn update_record(&mut self, id: &RecordId, draft: RecordDraft) -> Result<bool> {
        self.store.update(id, draft)
    }

    fn select_record(&mut self, id: Option<RecordId>) {
        self.store.select(id);
    }

    fn selected_id(&self) -> Option<&RecordId> {
        self.store.selected_id()
    }
}

#[cfg(test)]
mod tests {
    use super::StoreRuntime;
    use anyhow::Result;
    use eventview_app::{RecordDraft, RecordId, Severity};
    use eventview_store::RecordStore;
    use eventview_testkit::make_mock_events;
    use eventview_tui::AppRuntime;
    use time::macros::datetime;

    #[test]
    fn runtime_writes_through_to_store() -> Result<()> {
        let mut store = RecordStore::with_records(make_mock_events(3, 30))?;
        let id = {
            let mut runtime = StoreRuntime::new(&mut store);
            let id = runtime.create_record(RecordDraft {
                title: "Camera Offline".to_owned(),
                timestamp: datetime!(2026-03-02 14:00 UTC),
                description: None,
                severity: Some(Severity::High),
            })?;
            runtime.select_record(Some(id.clone()));
            assert_eq!(runtime.records().len(), 4);
            assert_eq!(runtime.selected_id(), Some(&id));
            id
        };
        assert_eq!(store.records()[0].id, id);
        assert_eq!(
            store.selected().map(|record| record.title.as_str()),
            Some("Camera Offline")
        );
        Ok(())
    }

    #[test]
    fn update_of_unknown_id_reports_false() -> Result<()> {
        let mut store = RecordStore::new();
        let mut runtime = StoreRuntime::new(&mut store);
        let updated = runtime.update_record(
            &RecordId::new("missing"),
            RecordDraft {
                title: "Tamper Alert".to_owned(),
                timestamp: datetime!(2026-03-02 14:00 UTC),
                description: None,
                severity: None,
            },
        )?;
        assert!(!updated);
        Ok(())
    }
}
