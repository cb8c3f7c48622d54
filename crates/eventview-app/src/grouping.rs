// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::dates::{day_key, day_label, local_date};
use crate::ids::RecordId;
use crate::model::{Record, Severity, SortDirection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineItem {
    pub id: RecordId,
    pub title: String,
    /// Already shifted to the grouping offset.
    pub timestamp: OffsetDateTime,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub day_key: String,
    pub date: Date,
    pub label: String,
    pub items: Vec<TimelineItem>,
}

impl DayBucket {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn group_by_day<'r>(
    records: impl IntoIterator<Item = &'r Record>,
    direction: SortDirection,
    offset: UtcOffset,
) -> Vec<DayBucket> {
    let mut by_date: BTreeMap<Date, Vec<TimelineItem>> = BTreeMap::new();
    for record in records {
        let timestamp = record.timestamp.to_offset(offset);
        by_date
            .entry(local_date(timestamp, offset))
            .or_default()
            .push(TimelineItem {
                id: record.id.clone(),
                title: record.title.clone(),
                timestamp,
                severity: record.severity,
            });
    }

    let mut buckets = by_date
        .into_iter()
        .map(|(date, mut items)| {
            // sort_by is stable, so equal timestamps keep input order.
            items.sort_by(|left, right| match direction {
                SortDirection::Asc => left.timestamp.cmp(&right.timestamp),
                SortDirection::Desc => right.timestamp.cmp(&left.timestamp),
            });
            DayBucket {
                day_key: day_key(date),
                date,
                label: day_label(date),
                items,
            }
        })
        .collect::<Vec<_>>();

    if direction == SortDirection::Desc {
        buckets.reverse();
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::group_by_day;
    use crate::ids::RecordId;
    use crate::model::{Record, SortDirection};
    use time::OffsetDateTime;
    use time::macros::{datetime, offset};

    fn record(id: &str, timestamp: OffsetDateTime) -> Record {
        Record {
            id: RecordId::new(id),
            title: format!("event {id}"),
            timestamp,
            description: None,
            severity: None,
        }
    }

    fn scenario() -> Vec<Record> {
        vec![
            record("1", datetime!(2026-01-01 10:00 UTC)),
            record("2", datetime!(2026-01-01 12:00 UTC)),
            record("3", datetime!(2026-01-02 09:00 UTC)),
            record("4", datetime!(2026-01-02 18:00 UTC)),
            record("5", datetime!(2026-01-02 07:00 UTC)),
        ]
    }

    fn ids(bucket: &super::DayBucket) -> Vec<&str> {
        bucket.items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn groups_descending_by_default_direction() {
        let records = scenario();
        let buckets = group_by_day(&records, SortDirection::Desc, offset!(UTC));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day_key, "2026-01-02");
        assert_eq!(buckets[0].label, "Jan 2, 2026");
        assert_eq!(ids(&buckets[0]), vec!["4", "3", "5"]);
        assert_eq!(buckets[1].day_key, "2026-01-01");
        assert_eq!(ids(&buckets[1]), vec!["2", "1"]);
    }

    #[test]
    fn groups_ascending() {
        let records = scenario();
        let buckets = group_by_day(&records, SortDirection::Asc, offset!(UTC));
        assert_eq!(buckets[0].day_key, "2026-01-01");
        assert_eq!(ids(&buckets[0]), vec!["1", "2"]);
        assert_eq!(ids(&buckets[1]), vec!["5", "3", "4"]);
    }

    #[test]
    fn every_record_lands_in_exactly_one_bucket() {
        let records = scenario();
        let buckets = group_by_day(&records, SortDirection::Desc, offset!(+9));
        let total = buckets.iter().map(|bucket| bucket.len()).sum::<usize>();
        assert_eq!(total, records.len());
        assert!(buckets.iter().all(|bucket| !bucket.is_empty()));
    }

    #[test]
    fn offset_moves_records_across_days() {
        let records = vec![record("late", datetime!(2026-01-02 02:00 UTC))];
        let utc = group_by_day(&records, SortDirection::Desc, offset!(UTC));
        assert_eq!(utc[0].day_key, "2026-01-02");

        let west = group_by_day(&records, SortDirection::Desc, offset!(-5));
        assert_eq!(west[0].day_key, "2026-01-01");
        assert_eq!(west[0].items[0].timestamp.hour(), 21);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let at = datetime!(2026-01-05 08:00 UTC);
        let records = vec![record("a", at), record("b", at), record("c", at)];
        let desc = group_by_day(&records, SortDirection::Desc, offset!(UTC));
        assert_eq!(ids(&desc[0]), vec!["a", "b", "c"]);
        let asc = group_by_day(&records, SortDirection::Asc, offset!(UTC));
        assert_eq!(ids(&asc[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        let records: Vec<Record> = Vec::new();
        assert!(group_by_day(&records, SortDirection::Desc, offset!(UTC)).is_empty());
    }
}
