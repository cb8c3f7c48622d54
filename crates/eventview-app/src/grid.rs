// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::filter::{
    Column, ColumnFilters, FilterMode, FilterQuery, SortSpec, apply_filters, apply_sort, paginate,
};
use crate::model::SortDirection;
use crate::resize::{DragState, ResizeSession, WidthBounds};

pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridState {
    /// Requested page; the derived view clamps it against the current rows.
    pub page: usize,
    pub sort: Option<SortSpec>,
    pub filter_mode: FilterMode,
    pub column_filters: ColumnFilters,
    pub global_query: String,
    pub hidden_column_ids: BTreeSet<String>,
    pub column_widths: BTreeMap<String, u16>,
    pub drag: DragState,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            page: 1,
            sort: None,
            filter_mode: FilterMode::Columns,
            column_filters: ColumnFilters::new(),
            global_query: String::new(),
            hidden_column_ids: BTreeSet::new(),
            column_widths: BTreeMap::new(),
            drag: DragState::Idle,
        }
    }
}

impl GridState {
    fn filter_query(&self) -> FilterQuery<'_> {
        match self.filter_mode {
            FilterMode::Columns => FilterQuery::Columns(&self.column_filters),
            FilterMode::Global => FilterQuery::Global(&self.global_query),
        }
    }

    pub fn sort_direction_for(&self, column_id: &str) -> Option<SortDirection> {
        self.sort
            .as_ref()
            .filter(|sort| sort.column_id == column_id)
            .map(|sort| sort.direction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridCommand {
    ToggleSort(String),
    SetColumnFilter { column_id: String, value: String },
    SetGlobalQuery(String),
    SetFilterMode(FilterMode),
    ClearFilters,
    SetColumnVisibility { column_id: String, visible: bool },
    ShowAllColumns,
    SetPage(usize),
    NextPage,
    PrevPage,
    ResizeColumn { column_id: String, delta: i32 },
    BeginResize { column_id: String, anchor_x: i32 },
    DragResize { x: i32 },
    EndResize,
    CancelResize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridRefusal {
    UnknownColumn(String),
    NotSortable(String),
    NotFilterable(String),
    NotHideable(String),
    KeepOneColumnVisible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    PageChanged(usize),
    SortChanged(Option<SortSpec>),
    FiltersChanged,
    FilterModeChanged(FilterMode),
    VisibilityChanged { column_id: String, visible: bool },
    ColumnsShown,
    ColumnWidthChanged { column_id: String, width: u16 },
    ResizeStarted(String),
    ResizeEnded(String),
    Refused(GridRefusal),
}

impl GridEvent {
    pub fn message(&self) -> Option<String> {
        match self {
            Self::PageChanged(_) | Self::FiltersChanged | Self::ColumnWidthChanged { .. } => None,
            Self::ResizeStarted(_) | Self::ResizeEnded(_) => None,
            Self::SortChanged(Some(sort)) => Some(format!(
                "sort {} {}",
                sort.column_id,
                sort.direction.as_str()
            )),
            Self::SortChanged(None) => Some("sort cleared".to_owned()),
            Self::FilterModeChanged(mode) => Some(format!("filter mode: {}", mode.as_str())),
            Self::VisibilityChanged {
                column_id,
                visible: true,
            } => Some(format!("column shown: {column_id}")),
            Self::VisibilityChanged {
                column_id,
                visible: false,
            } => Some(format!("column hidden: {column_id}")),
            Self::ColumnsShown => Some("all columns shown".to_owned()),
            Self::Refused(GridRefusal::UnknownColumn(id)) => Some(format!("no column {id}")),
            Self::Refused(GridRefusal::NotSortable(id)) => Some(format!("{id} is not sortable")),
            Self::Refused(GridRefusal::NotFilterable(id)) => {
                Some(format!("{id} is not filterable"))
            }
            Self::Refused(GridRefusal::NotHideable(id)) => Some(format!("{id} cannot be hidden")),
            Self::Refused(GridRefusal::KeepOneColumnVisible) => {
                Some("keep one column visible".to_owned())
            }
        }
    }
}

/// Read-only snapshot of what the grid renders.
#[derive(Debug)]
pub struct GridView<'g, 'r, T> {
    pub visible_columns: Vec<&'g Column<T>>,
    pub page_rows: Vec<&'r T>,
    pub total_filtered_count: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

pub struct Grid<T> {
    columns: Vec<Column<T>>,
    page_size: usize,
    bounds: WidthBounds,
    state: GridState,
}

impl<T> Grid<T> {
    pub fn new(columns: Vec<Column<T>>, page_size: usize) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.id()) {
                bail!("duplicate column id {:?} in grid definition", column.id());
            }
        }

        let mut state = GridState::default();
        state.hidden_column_ids = columns
            .iter()
            .filter(|column| column.is_initially_hidden())
            .map(|column| column.id().to_owned())
            .collect();
        if state.hidden_column_ids.len() >= columns.len() {
            if let Some(first) = columns.first() {
                state.hidden_column_ids.remove(first.id());
            }
        }

        Ok(Self {
            columns,
            page_size: page_size.max(1),
            bounds: WidthBounds::default(),
            state,
        })
    }

    pub fn with_width_bounds(mut self, bounds: WidthBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.state.filter_mode = mode;
        self
    }

    pub fn with_initial_page(mut self, page: usize) -> Self {
        self.state.page = page.max(1);
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn column(&self, column_id: &str) -> Option<&Column<T>> {
        self.columns.iter().find(|column| column.id() == column_id)
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn width_bounds(&self) -> WidthBounds {
        self.bounds
    }

    pub fn column_width(&self, column_id: &str) -> u16 {
        self.state
            .column_widths
            .get(column_id)
            .copied()
            .unwrap_or(self.bounds.default_width())
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        !self.state.hidden_column_ids.contains(column_id)
    }

    pub fn visible_columns(&self) -> Vec<&Column<T>> {
        self.columns
            .iter()
            .filter(|column| self.is_visible(column.id()))
            .collect()
    }

    /// Visible columns -> filter -> sort -> clamp page -> page window.
    pub fn view<'g, 'r>(&'g self, rows: &'r [T]) -> GridView<'g, 'r, T> {
        let visible_columns = self.visible_columns();
        let all = rows.iter().collect::<Vec<_>>();
        let filtered = apply_filters(&all, &visible_columns, self.state.filter_query());
        let sorted = apply_sort(&filtered, self.state.sort.as_ref(), &visible_columns);
        let total_pages = self.pages_for(sorted.len());
        let current_page = self.state.page.clamp(1, total_pages);
        let page_rows = paginate(&sorted, current_page, self.page_size).to_vec();

        GridView {
            visible_columns,
            page_rows,
            total_filtered_count: sorted.len(),
            total_count: rows.len(),
            total_pages,
            current_page,
        }
    }

    pub fn total_pages(&self, rows: &[T]) -> usize {
        let visible_columns = self.visible_columns();
        let all = rows.iter().collect::<Vec<_>>();
        let filtered = apply_filters(&all, &visible_columns, self.state.filter_query());
        self.pages_for(filtered.len())
    }

    fn pages_for(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    pub fn dispatch(&mut self, rows: &[T], command: GridCommand) -> Vec<GridEvent> {
        debug!(?command, "grid command");
        match command {
            GridCommand::ToggleSort(column_id) => self.toggle_sort(&column_id),
            GridCommand::SetColumnFilter { column_id, value } => {
                self.set_column_filter(&column_id, &value)
            }
            GridCommand::SetGlobalQuery(value) => {
                let trimmed = value.trim();
                if trimmed == self.state.global_query {
                    return Vec::new();
                }
                self.state.global_query = trimmed.to_owned();
                self.with_page_reset(vec![GridEvent::FiltersChanged])
            }
            GridCommand::SetFilterMode(mode) => {
                if mode == self.state.filter_mode {
                    return Vec::new();
                }
                self.state.filter_mode = mode;
                self.with_page_reset(vec![GridEvent::FilterModeChanged(mode)])
            }
            GridCommand::ClearFilters => {
                self.state.column_filters.clear();
                self.state.global_query.clear();
                self.with_page_reset(vec![GridEvent::FiltersChanged])
            }
            GridCommand::SetColumnVisibility { column_id, visible } => {
                self.set_column_visibility(&column_id, visible)
            }
            GridCommand::ShowAllColumns => {
                if self.state.hidden_column_ids.is_empty() {
                    return Vec::new();
                }
                self.state.hidden_column_ids.clear();
                self.with_page_reset(vec![GridEvent::ColumnsShown])
            }
            GridCommand::SetPage(page) => self.set_page(rows, page),
            GridCommand::NextPage => {
                let page = self.state.page.saturating_add(1);
                self.set_page(rows, page)
            }
            GridCommand::PrevPage => {
                let page = self.state.page.saturating_sub(1);
                self.set_page(rows, page)
            }
            GridCommand::ResizeColumn { column_id, delta } => {
                if self.column(&column_id).is_none() {
                    return refuse(GridRefusal::UnknownColumn(column_id));
                }
                let width = self
                    .bounds
                    .resized(self.state.column_widths.get(&column_id).copied(), delta);
                self.state.column_widths.insert(column_id.clone(), width);
                vec![GridEvent::ColumnWidthChanged { column_id, width }]
            }
            GridCommand::BeginResize {
                column_id,
                anchor_x,
            } => self.begin_resize(&column_id, anchor_x),
            GridCommand::DragResize { x } => {
                let Some(column_id) = self.state.drag.column_id().map(str::to_owned) else {
                    return Vec::new();
                };
                self.drag_resize(x)
                    .map(|width| GridEvent::ColumnWidthChanged { column_id, width })
                    .into_iter()
                    .collect()
            }
            GridCommand::EndResize => self.finish_resize(false).into_iter().collect(),
            GridCommand::CancelResize => self.finish_resize(true).into_iter().collect(),
        }
    }

    /// Starts a drag that ends when the returned guard drops.
    pub fn resize_session(
        &mut self,
        column_id: &str,
        anchor_x: i32,
    ) -> Option<ResizeSession<'_, T>> {
        let events = self.begin_resize(column_id, anchor_x);
        if matches!(events.last(), Some(GridEvent::ResizeStarted(_))) {
            Some(ResizeSession::new(self))
        } else {
            None
        }
    }

    fn toggle_sort(&mut self, column_id: &str) -> Vec<GridEvent> {
        let Some(column) = self.column(column_id) else {
            return refuse(GridRefusal::UnknownColumn(column_id.to_owned()));
        };
        if !column.is_sortable() {
            return refuse(GridRefusal::NotSortable(column_id.to_owned()));
        }

        self.state.sort = match self.state.sort_direction_for(column_id) {
            None => Some(SortSpec {
                column_id: column_id.to_owned(),
                direction: SortDirection::Asc,
            }),
            Some(SortDirection::Asc) => Some(SortSpec {
                column_id: column_id.to_owned(),
                direction: SortDirection::Desc,
            }),
            Some(SortDirection::Desc) => None,
        };
        self.with_page_reset(vec![GridEvent::SortChanged(self.state.sort.clone())])
    }

    fn set_column_filter(&mut self, column_id: &str, value: &str) -> Vec<GridEvent> {
        let Some(column) = self.column(column_id) else {
            return refuse(GridRefusal::UnknownColumn(column_id.to_owned()));
        };
        if !column.is_filterable() {
            return refuse(GridRefusal::NotFilterable(column_id.to_owned()));
        }

        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.state.column_filters.remove(column_id);
        } else {
            self.state
                .column_filters
                .insert(column_id.to_owned(), trimmed.to_owned());
        }
        self.with_page_reset(vec![GridEvent::FiltersChanged])
    }

    fn set_column_visibility(&mut self, column_id: &str, visible: bool) -> Vec<GridEvent> {
        let Some(column) = self.column(column_id) else {
            return refuse(GridRefusal::UnknownColumn(column_id.to_owned()));
        };

        if visible {
            if !self.state.hidden_column_ids.remove(column_id) {
                return Vec::new();
            }
        } else {
            if !column.is_hideable() {
                return refuse(GridRefusal::NotHideable(column_id.to_owned()));
            }
            if !self.is_visible(column_id) {
                return Vec::new();
            }
            if self.visible_columns().len() <= 1 {
                return refuse(GridRefusal::KeepOneColumnVisible);
            }
            self.state.hidden_column_ids.insert(column_id.to_owned());
        }

        self.with_page_reset(vec![GridEvent::VisibilityChanged {
            column_id: column_id.to_owned(),
            visible,
        }])
    }

    fn set_page(&mut self, rows: &[T], page: usize) -> Vec<GridEvent> {
        let clamped = page.clamp(1, self.total_pages(rows));
        if clamped == self.state.page {
            return Vec::new();
        }
        self.state.page = clamped;
        vec![GridEvent::PageChanged(clamped)]
    }

    fn with_page_reset(&mut self, mut events: Vec<GridEvent>) -> Vec<GridEvent> {
        if self.state.page != 1 {
            self.state.page = 1;
            events.push(GridEvent::PageChanged(1));
        }
        events
    }

    fn begin_resize(&mut self, column_id: &str, anchor_x: i32) -> Vec<GridEvent> {
        if self.column(column_id).is_none() {
            return refuse(GridRefusal::UnknownColumn(column_id.to_owned()));
        }
        let mut events = self.finish_resize(false).into_iter().collect::<Vec<_>>();
        self.state.drag = DragState::Dragging {
            column_id: column_id.to_owned(),
            anchor_x,
            anchor_width: self.column_width(column_id),
        };
        events.push(GridEvent::ResizeStarted(column_id.to_owned()));
        events
    }

    pub(crate) fn drag_resize(&mut self, x: i32) -> Option<u16> {
        let DragState::Dragging {
            column_id,
            anchor_x,
            anchor_width,
        } = &self.state.drag
        else {
            return None;
        };
        let width = self.bounds.dragged(*anchor_width, *anchor_x, x);
        self.state.column_widths.insert(column_id.clone(), width);
        Some(width)
    }

    pub(crate) fn finish_resize(&mut self, restore: bool) -> Option<GridEvent> {
        let DragState::Dragging {
            column_id,
            anchor_width,
            ..
        } = std::mem::take(&mut self.state.drag)
        else {
            return None;
        };
        if restore {
            self.state
                .column_widths
                .insert(column_id.clone(), anchor_width);
        }
        Some(GridEvent::ResizeEnded(column_id))
    }
}

fn refuse(refusal: GridRefusal) -> Vec<GridEvent> {
    debug!(?refusal, "grid command refused");
    vec![GridEvent::Refused(refusal)]
}

#[cfg(test)]
mod tests {
    use super::{Grid, GridCommand, GridEvent, GridRefusal};
    use crate::filter::{Column, FilterMode, SortValue};
    use crate::model::SortDirection;
    use crate::resize::DragState;
    use anyhow::Result;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: String,
        rank: i64,
        kind: &'static str,
    }

    fn items(count: i64) -> Vec<Item> {
        (1..=count)
            .map(|rank| Item {
                name: format!("item {rank:02}"),
                rank,
                kind: if rank % 2 == 0 { "even" } else { "odd" },
            })
            .collect()
    }

    fn columns() -> Vec<Column<Item>> {
        vec![
            Column::new("name", "Name", |item: &Item| item.name.clone())
                .sort_key(|item: &Item| Some(SortValue::from(item.name.clone()))),
            Column::new("rank", "Rank", |item: &Item| item.rank.to_string())
                .sort_key(|item: &Item| Some(SortValue::from(item.rank))),
            Column::new("kind", "Kind", |item: &Item| item.kind.to_owned())
                .filter_key(|item: &Item| item.kind.to_owned()),
            Column::new("notes", "Notes", |_: &Item| String::new()).hideable(false),
        ]
    }

    fn grid(page_size: usize) -> Result<Grid<Item>> {
        Grid::new(columns(), page_size)
    }

    fn set(grid: &mut Grid<Item>, rows: &[Item], command: GridCommand) -> Vec<GridEvent> {
        grid.dispatch(rows, command)
    }

    #[test]
    fn new_rejects_duplicate_column_ids() {
        let mut columns = columns();
        columns.push(Column::new("name", "Again", |item: &Item| item.name.clone()));
        assert!(Grid::new(columns, 10).is_err());
    }

    #[test]
    fn initial_hidden_never_hides_everything() -> Result<()> {
        let columns = vec![
            Column::new("a", "A", |item: &Item| item.name.clone()).initially_hidden(),
            Column::new("b", "B", |item: &Item| item.kind.to_owned()).initially_hidden(),
        ];
        let grid = Grid::new(columns, 10)?;
        let rows = items(3);
        let view = grid.view(&rows);
        assert_eq!(
            view.visible_columns
                .iter()
                .map(|column| column.id())
                .collect::<Vec<_>>(),
            vec!["a"]
        );
        Ok(())
    }

    #[test]
    fn view_paginates_in_derivation_order() -> Result<()> {
        let grid = grid(4)?;
        let rows = items(10);
        let view = grid.view(&rows);
        assert_eq!(view.total_count, 10);
        assert_eq!(view.total_filtered_count, 10);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.current_page, 1);
        assert_eq!(view.page_rows.len(), 4);
        Ok(())
    }

    #[test]
    fn empty_rows_still_have_one_page() -> Result<()> {
        let grid = grid(4)?;
        let view = grid.view(&[]);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.current_page, 1);
        assert!(view.page_rows.is_empty());
        Ok(())
    }

    #[test]
    fn toggle_sort_cycles_and_resets_page() -> Result<()> {
        let mut grid = grid(3)?;
        let rows = items(9);
        set(&mut grid, &rows, GridCommand::SetPage(3));
        assert_eq!(grid.state().page, 3);

        let events = set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        assert_eq!(grid.state().sort_direction_for("rank"), Some(SortDirection::Asc));
        assert_eq!(grid.state().page, 1);
        assert!(events.contains(&GridEvent::PageChanged(1)));

        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        assert_eq!(
            grid.state().sort_direction_for("rank"),
            Some(SortDirection::Desc)
        );
        let view = grid.view(&rows);
        assert_eq!(view.page_rows[0].rank, 9);

        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        assert_eq!(grid.state().sort, None);
        Ok(())
    }

    #[test]
    fn toggle_sort_on_other_column_starts_ascending() -> Result<()> {
        let mut grid = grid(3)?;
        let rows = items(3);
        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        set(&mut grid, &rows, GridCommand::ToggleSort("name".to_owned()));
        assert_eq!(grid.state().sort_direction_for("name"), Some(SortDirection::Asc));
        assert_eq!(grid.state().sort_direction_for("rank"), None);
        Ok(())
    }

    #[test]
    fn toggle_sort_refuses_unsortable_and_unknown() -> Result<()> {
        let mut grid = grid(3)?;
        let rows = items(3);
        assert_eq!(
            set(&mut grid, &rows, GridCommand::ToggleSort("kind".to_owned())),
            vec![GridEvent::Refused(GridRefusal::NotSortable("kind".to_owned()))]
        );
        assert_eq!(
            set(&mut grid, &rows, GridCommand::ToggleSort("nope".to_owned())),
            vec![GridEvent::Refused(GridRefusal::UnknownColumn(
                "nope".to_owned()
            ))]
        );
        assert_eq!(grid.state().sort, None);
        Ok(())
    }

    #[test]
    fn column_filter_trims_and_removes_blank_values() -> Result<()> {
        let mut grid = grid(10)?;
        let rows = items(6);
        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnFilter {
                column_id: "kind".to_owned(),
                value: "  EVEN ".to_owned(),
            },
        );
        assert_eq!(
            grid.state().column_filters.get("kind").map(String::as_str),
            Some("EVEN")
        );
        assert_eq!(grid.view(&rows).total_filtered_count, 3);

        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnFilter {
                column_id: "kind".to_owned(),
                value: "   ".to_owned(),
            },
        );
        assert!(grid.state().column_filters.is_empty());
        assert_eq!(grid.view(&rows).total_filtered_count, 6);
        Ok(())
    }

    #[test]
    fn filter_shrinking_results_clamps_current_page() -> Result<()> {
        let mut grid = grid(2)?;
        let rows = items(10);
        set(&mut grid, &rows, GridCommand::SetPage(5));
        assert_eq!(grid.view(&rows).current_page, 5);

        // Filters reset the page; also check the derived clamp on its own.
        grid.state.page = 5;
        grid.state
            .column_filters
            .insert("name".to_owned(), "item 0".to_owned());
        let view = grid.view(&rows);
        assert_eq!(view.total_filtered_count, 9);
        assert_eq!(view.total_pages, 5);

        grid.state
            .column_filters
            .insert("name".to_owned(), "item 1".to_owned());
        let view = grid.view(&rows);
        assert_eq!(view.total_filtered_count, 1);
        assert_eq!(view.total_pages, 1);
        assert_eq!(view.current_page, 1);
        Ok(())
    }

    #[test]
    fn set_page_clamps_to_range() -> Result<()> {
        let mut grid = grid(4)?;
        let rows = items(10);
        set(&mut grid, &rows, GridCommand::SetPage(99));
        assert_eq!(grid.state().page, 3);
        set(&mut grid, &rows, GridCommand::SetPage(0));
        assert_eq!(grid.state().page, 1);
        assert!(set(&mut grid, &rows, GridCommand::PrevPage).is_empty());
        set(&mut grid, &rows, GridCommand::NextPage);
        assert_eq!(grid.state().page, 2);
        Ok(())
    }

    #[test]
    fn page_stays_in_range_across_operations() -> Result<()> {
        let mut grid = grid(3)?;
        let rows = items(20);
        let commands = [
            GridCommand::SetPage(7),
            GridCommand::ToggleSort("rank".to_owned()),
            GridCommand::NextPage,
            GridCommand::NextPage,
            GridCommand::SetColumnFilter {
                column_id: "kind".to_owned(),
                value: "odd".to_owned(),
            },
            GridCommand::SetPage(100),
            GridCommand::SetFilterMode(FilterMode::Global),
            GridCommand::SetGlobalQuery("item 1".to_owned()),
            GridCommand::NextPage,
            GridCommand::PrevPage,
        ];
        for command in commands {
            set(&mut grid, &rows, command);
            let view = grid.view(&rows);
            assert!(view.current_page >= 1);
            assert!(view.current_page <= view.total_pages);
        }
        Ok(())
    }

    #[test]
    fn hiding_last_visible_column_is_refused() -> Result<()> {
        let columns = vec![
            Column::new("a", "A", |item: &Item| item.name.clone()),
            Column::new("b", "B", |item: &Item| item.kind.to_owned()),
        ];
        let mut grid = Grid::new(columns, 10)?;
        let rows = items(2);

        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "a".to_owned(),
                visible: false,
            },
        );
        let events = set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "b".to_owned(),
                visible: false,
            },
        );
        assert_eq!(
            events,
            vec![GridEvent::Refused(GridRefusal::KeepOneColumnVisible)]
        );
        assert_eq!(grid.visible_columns().len(), 1);

        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "a".to_owned(),
                visible: true,
            },
        );
        assert_eq!(grid.visible_columns().len(), 2);
        Ok(())
    }

    #[test]
    fn show_all_columns_is_quiet_when_nothing_is_hidden() -> Result<()> {
        let mut grid = grid(4)?;
        let rows = items(10);
        set(&mut grid, &rows, GridCommand::SetPage(2));

        assert!(set(&mut grid, &rows, GridCommand::ShowAllColumns).is_empty());
        assert_eq!(grid.state().page, 2);

        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "kind".to_owned(),
                visible: false,
            },
        );
        set(&mut grid, &rows, GridCommand::SetPage(2));
        let events = set(&mut grid, &rows, GridCommand::ShowAllColumns);
        assert_eq!(
            events,
            vec![GridEvent::ColumnsShown, GridEvent::PageChanged(1)]
        );
        assert_eq!(grid.visible_columns().len(), 4);
        Ok(())
    }

    #[test]
    fn initial_page_is_clamped_by_the_view() -> Result<()> {
        let rows = items(10);
        let second = grid(4)?.with_initial_page(2);
        assert_eq!(second.view(&rows).current_page, 2);
        assert_eq!(second.view(&rows).page_rows[0].rank, 5);

        let beyond = grid(4)?.with_initial_page(9);
        assert_eq!(beyond.view(&rows).current_page, 3);
        assert_eq!(grid(4)?.with_initial_page(0).state().page, 1);
        Ok(())
    }

    #[test]
    fn visible_columns_never_empty_after_any_sequence() -> Result<()> {
        let mut grid = grid(5)?;
        let rows = items(5);
        let ids = ["name", "rank", "kind", "notes", "ghost"];
        for (step, id) in ids.iter().cycle().take(40).enumerate() {
            set(
                &mut grid,
                &rows,
                GridCommand::SetColumnVisibility {
                    column_id: (*id).to_owned(),
                    visible: step % 7 == 0,
                },
            );
            assert!(!grid.view(&rows).visible_columns.is_empty());
        }
        Ok(())
    }

    #[test]
    fn non_hideable_column_is_refused() -> Result<()> {
        let mut grid = grid(5)?;
        let rows = items(2);
        let events = set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "notes".to_owned(),
                visible: false,
            },
        );
        assert_eq!(
            events,
            vec![GridEvent::Refused(GridRefusal::NotHideable(
                "notes".to_owned()
            ))]
        );
        Ok(())
    }

    #[test]
    fn hidden_columns_do_not_filter_or_sort() -> Result<()> {
        let mut grid = grid(10)?;
        let rows = items(6);
        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnFilter {
                column_id: "kind".to_owned(),
                value: "odd".to_owned(),
            },
        );
        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        set(&mut grid, &rows, GridCommand::ToggleSort("rank".to_owned()));
        assert_eq!(grid.view(&rows).total_filtered_count, 3);

        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "kind".to_owned(),
                visible: false,
            },
        );
        set(
            &mut grid,
            &rows,
            GridCommand::SetColumnVisibility {
                column_id: "rank".to_owned(),
                visible: false,
            },
        );
        let view = grid.view(&rows);
        assert_eq!(view.total_filtered_count, 6);
        assert_eq!(view.page_rows[0].rank, 1);
        Ok(())
    }

    #[test]
    fn global_mode_ors_across_columns() -> Result<()> {
        let mut grid = grid(10)?.with_filter_mode(FilterMode::Global);
        let rows = items(12);
        set(
            &mut grid,
            &rows,
            GridCommand::SetGlobalQuery("1".to_owned()),
        );
        // Names "item 01", "item 10".."item 12" plus ranks containing "1".
        let view = grid.view(&rows);
        assert_eq!(view.total_filtered_count, 4);

        set(
            &mut grid,
            &rows,
            GridCommand::SetFilterMode(FilterMode::Columns),
        );
        assert_eq!(grid.view(&rows).total_filtered_count, 12);
        Ok(())
    }

    #[test]
    fn resize_column_clamps_and_ignores_unknown_ids() -> Result<()> {
        let mut grid = grid(5)?;
        let rows = items(1);
        set(
            &mut grid,
            &rows,
            GridCommand::ResizeColumn {
                column_id: "name".to_owned(),
                delta: 16,
            },
        );
        assert_eq!(grid.column_width("name"), 196);
        set(
            &mut grid,
            &rows,
            GridCommand::ResizeColumn {
                column_id: "name".to_owned(),
                delta: 10_000,
            },
        );
        assert_eq!(grid.column_width("name"), 640);
        assert_eq!(grid.column_width("rank"), 180);

        let events = set(
            &mut grid,
            &rows,
            GridCommand::ResizeColumn {
                column_id: "ghost".to_owned(),
                delta: 16,
            },
        );
        assert_eq!(
            events,
            vec![GridEvent::Refused(GridRefusal::UnknownColumn(
                "ghost".to_owned()
            ))]
        );
        assert!(!grid.state().column_widths.contains_key("ghost"));
        Ok(())
    }

    #[test]
    fn drag_session_tracks_anchor_and_ends() -> Result<()> {
        let mut grid = grid(5)?;
        let rows = items(1);
        set(
            &mut grid,
            &rows,
            GridCommand::BeginResize {
                column_id: "rank".to_owned(),
                anchor_x: 100,
            },
        );
        set(&mut grid, &rows, GridCommand::DragResize { x: 160 });
        assert_eq!(grid.column_width("rank"), 240);
        set(&mut grid, &rows, GridCommand::DragResize { x: -400 });
        assert_eq!(grid.column_width("rank"), 120);

        let events = set(&mut grid, &rows, GridCommand::EndResize);
        assert_eq!(events, vec![GridEvent::ResizeEnded("rank".to_owned())]);
        assert_eq!(grid.state().drag, DragState::Idle);
        assert!(set(&mut grid, &rows, GridCommand::DragResize { x: 999 }).is_empty());
        assert_eq!(grid.column_width("rank"), 120);
        Ok(())
    }

    #[test]
    fn cancel_resize_restores_anchor_width() -> Result<()> {
        let mut grid = grid(5)?;
        let rows = items(1);
        set(
            &mut grid,
            &rows,
            GridCommand::BeginResize {
                column_id: "name".to_owned(),
                anchor_x: 0,
            },
        );
        set(&mut grid, &rows, GridCommand::DragResize { x: 300 });
        set(&mut grid, &rows, GridCommand::CancelResize);
        assert_eq!(grid.column_width("name"), 180);
        assert_eq!(grid.state().drag, DragState::Idle);
        Ok(())
    }

    #[test]
    fn resize_session_guard_always_releases() -> Result<()> {
        let mut grid = grid(5)?;
        {
            let mut session = grid
                .resize_session("name", 10)
                .expect("known column starts a session");
            assert_eq!(session.column_id(), Some("name"));
            assert_eq!(session.drag_to(50), Some(220));
        }
        assert_eq!(grid.state().drag, DragState::Idle);
        assert_eq!(grid.column_width("name"), 220);

        let session = grid.resize_session("name", 0).expect("session");
        session.cancel();
        assert_eq!(grid.column_width("name"), 220);
        assert!(grid.resize_session("ghost", 0).is_none());
        assert_eq!(grid.state().drag, DragState::Idle);
        Ok(())
    }
}
