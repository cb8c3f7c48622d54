// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::UtcOffset;

use crate::dates::datetime_label;
use crate::filter::{Column, SortValue};
use crate::model::Record;

pub const TITLE_COLUMN: &str = "title";
pub const WHEN_COLUMN: &str = "when";
pub const SEVERITY_COLUMN: &str = "severity";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const ID_COLUMN: &str = "id";

/// Default grid columns for event records. Times render at `offset`.
pub fn record_columns(offset: UtcOffset) -> Vec<Column<Record>> {
    vec![
        Column::new(TITLE_COLUMN, "Title", |record: &Record| record.title.clone())
            .sort_key(|record: &Record| Some(SortValue::from(record.title.as_str())))
            .hideable(false),
        Column::new(WHEN_COLUMN, "When", move |record: &Record| {
            datetime_label(record.timestamp, offset)
        })
        .sort_key(|record: &Record| Some(SortValue::from(record.timestamp.unix_timestamp())))
        .filter_key(move |record: &Record| datetime_label(record.timestamp, offset)),
        Column::new(SEVERITY_COLUMN, "Severity", |record: &Record| {
            record
                .severity
                .map(|severity| severity.as_str().to_owned())
                .unwrap_or_default()
        })
        .sort_key(|record: &Record| record.severity.map(|severity| SortValue::from(severity.rank())))
        .filter_key(|record: &Record| {
            record
                .severity
                .map(|severity| severity.as_str().to_owned())
                .unwrap_or_default()
        }),
        Column::new(DESCRIPTION_COLUMN, "Description", |record: &Record| {
            record.description.clone().unwrap_or_default()
        })
        .filter_key(|record: &Record| record.description.clone().unwrap_or_default()),
        Column::new(ID_COLUMN, "Id", |record: &Record| record.id.to_string())
            .filter_key(|record: &Record| record.id.to_string())
            .initially_hidden(),
    ]
}

#[cfg(test)]
mod tests {
    use super::{ID_COLUMN, SEVERITY_COLUMN, TITLE_COLUMN, WHEN_COLUMN, record_columns};
    use crate::filter::SortValue;
    use crate::ids::RecordId;
    use crate::model::{Record, Severity};
    use time::macros::{datetime, offset};

    fn record() -> Record {
        Record {
            id: RecordId::new("evt-9"),
            title: "Motion Detected".to_owned(),
            timestamp: datetime!(2026-01-04 23:10 UTC),
            description: None,
            severity: Some(Severity::Medium),
        }
    }

    #[test]
    fn capabilities_per_column() {
        let columns = record_columns(offset!(UTC));
        let find = |id: &str| {
            columns
                .iter()
                .find(|column| column.id() == id)
                .expect("column exists")
        };
        assert!(find(TITLE_COLUMN).is_sortable());
        assert!(!find(TITLE_COLUMN).is_hideable());
        assert!(find(WHEN_COLUMN).is_sortable());
        assert!(!find(ID_COLUMN).is_sortable());
        assert!(find(ID_COLUMN).is_initially_hidden());
        assert!(find(SEVERITY_COLUMN).is_filterable());
    }

    #[test]
    fn rendering_uses_offset() {
        let columns = record_columns(offset!(+2));
        let record = record();
        assert_eq!(columns[1].render(&record), "2026-01-05 01:10");
        assert_eq!(columns[2].render(&record), "medium");
        assert_eq!(columns[3].render(&record), "");
        assert_eq!(columns[2].sort_value(&record), Some(SortValue::Integer(2)));
    }
}
