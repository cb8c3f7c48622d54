// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Column descriptors and the pure filter/sort/paginate stages of the grid
//! pipeline. Nothing here owns state; [`crate::grid::Grid`] composes these.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::model::SortDirection;

/// Primitive a column can sort by. Integers keep their own variant so large
/// values such as unix timestamps never lose precision through `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Integer(i64),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for SortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for SortValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SortValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

type Accessor<T> = Box<dyn Fn(&T) -> String>;
type SortKey<T> = Box<dyn Fn(&T) -> Option<SortValue>>;
type FilterKey<T> = Box<dyn Fn(&T) -> String>;

/// A grid column. The presence of `sort_key`/`filter_key` is the capability;
/// the explicit flags only override the inferred defaults.
pub struct Column<T> {
    id: String,
    label: String,
    accessor: Accessor<T>,
    sort_key: Option<SortKey<T>>,
    filter_key: Option<FilterKey<T>>,
    sortable: Option<bool>,
    filterable: Option<bool>,
    hideable: Option<bool>,
    initially_hidden: bool,
}

impl<T> Column<T> {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        accessor: impl Fn(&T) -> String + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            accessor: Box::new(accessor),
            sort_key: None,
            filter_key: None,
            sortable: None,
            filterable: None,
            hideable: None,
            initially_hidden: false,
        }
    }

    pub fn sort_key(mut self, key: impl Fn(&T) -> Option<SortValue> + 'static) -> Self {
        self.sort_key = Some(Box::new(key));
        self
    }

    pub fn filter_key(mut self, key: impl Fn(&T) -> String + 'static) -> Self {
        self.filter_key = Some(Box::new(key));
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = Some(filterable);
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = Some(hideable);
        self
    }

    pub fn initially_hidden(mut self) -> Self {
        self.initially_hidden = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn render(&self, row: &T) -> String {
        (self.accessor)(row)
    }

    pub fn sort_value(&self, row: &T) -> Option<SortValue> {
        self.sort_key.as_ref().and_then(|key| key(row))
    }

    pub fn has_sort_key(&self) -> bool {
        self.sort_key.is_some()
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable.unwrap_or(self.sort_key.is_some())
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
            .unwrap_or(self.filter_key.is_some() || self.sort_key.is_some())
    }

    pub fn is_hideable(&self) -> bool {
        self.hideable.unwrap_or(true)
    }

    pub fn is_initially_hidden(&self) -> bool {
        self.initially_hidden
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("sortable", &self.is_sortable())
            .field("filterable", &self.is_filterable())
            .field("hideable", &self.is_hideable())
            .field("initially_hidden", &self.initially_hidden)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column_id: String,
    pub direction: SortDirection,
}

/// Column id -> trimmed, non-empty query.
pub type ColumnFilters = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Every active column filter must match.
    #[default]
    Columns,
    /// One query; any filterable column may match.
    Global,
}

impl FilterMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Global => "global",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FilterQuery<'q> {
    Columns(&'q ColumnFilters),
    Global(&'q str),
}

pub fn filter_text<T>(column: &Column<T>, row: &T) -> String {
    if let Some(key) = &column.filter_key {
        return key(row);
    }
    column
        .sort_value(row)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

pub fn matches_query(text: &str, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    text.to_lowercase().contains(&query.to_lowercase())
}

pub fn apply_column_filters<'r, T>(
    rows: &[&'r T],
    columns: &[&Column<T>],
    filters: &ColumnFilters,
) -> Vec<&'r T> {
    let active = columns
        .iter()
        .filter_map(|column| {
            filters
                .get(column.id())
                .filter(|query| !query.trim().is_empty())
                .map(|query| (*column, query.as_str()))
        })
        .collect::<Vec<_>>();
    if active.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .copied()
        .filter(|row| {
            active
                .iter()
                .all(|(column, query)| matches_query(&filter_text(column, row), query))
        })
        .collect()
}

pub fn apply_global_filter<'r, T>(
    rows: &[&'r T],
    columns: &[&Column<T>],
    query: &str,
) -> Vec<&'r T> {
    if query.trim().is_empty() {
        return rows.to_vec();
    }
    let searchable = columns
        .iter()
        .copied()
        .filter(|column| column.is_filterable())
        .collect::<Vec<_>>();

    rows.iter()
        .copied()
        .filter(|row| {
            searchable
                .iter()
                .any(|column| matches_query(&filter_text(column, row), query))
        })
        .collect()
}

pub fn apply_filters<'r, T>(
    rows: &[&'r T],
    columns: &[&Column<T>],
    query: FilterQuery<'_>,
) -> Vec<&'r T> {
    match query {
        FilterQuery::Columns(filters) => apply_column_filters(rows, columns, filters),
        FilterQuery::Global(query) => apply_global_filter(rows, columns, query),
    }
}

/// Total order over optional sort values: missing values sort last, numbers
/// and booleans compare natively, anything else compares as text. An integer
/// meeting a float compares as `f64`.
pub fn compare_values(left: Option<&SortValue>, right: Option<&SortValue>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(SortValue::Integer(left)), Some(SortValue::Integer(right))) => left.cmp(right),
        (Some(SortValue::Number(left)), Some(SortValue::Number(right))) => left.total_cmp(right),
        (Some(SortValue::Integer(left)), Some(SortValue::Number(right))) => {
            (*left as f64).total_cmp(right)
        }
        (Some(SortValue::Number(left)), Some(SortValue::Integer(right))) => {
            left.total_cmp(&(*right as f64))
        }
        (Some(SortValue::Bool(left)), Some(SortValue::Bool(right))) => left.cmp(right),
        (Some(left), Some(right)) => compare_text(&left.to_string(), &right.to_string()),
    }
}

// Case-insensitive first; lowercase sorts before uppercase on ties.
fn compare_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| right.cmp(left))
}

pub fn apply_sort<'r, T>(
    rows: &[&'r T],
    sort: Option<&SortSpec>,
    columns: &[&Column<T>],
) -> Vec<&'r T> {
    let Some(sort) = sort else {
        return rows.to_vec();
    };
    let Some(column) = columns
        .iter()
        .find(|column| column.id() == sort.column_id && column.has_sort_key())
    else {
        return rows.to_vec();
    };

    let mut keyed = rows
        .iter()
        .copied()
        .enumerate()
        .map(|(index, row)| (index, column.sort_value(row), row))
        .collect::<Vec<_>>();
    keyed.sort_by(|(left_index, left, _), (right_index, right, _)| {
        let order = compare_values(left.as_ref(), right.as_ref());
        let order = match sort.direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        };
        order.then(left_index.cmp(right_index))
    });
    keyed.into_iter().map(|(_, _, row)| row).collect()
}

/// Rows `[(page-1)*page_size, page*page_size)`, clipped to the slice. Callers
/// clamp `page`; page 0 or a zero page size yields an empty window.
pub fn paginate<U>(rows: &[U], page: usize, page_size: usize) -> &[U] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(rows.len());
    let end = page.saturating_mul(page_size).min(rows.len());
    &rows[start..end]
}
