// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use eventview_app::dates::time_label;
use eventview_app::{
    AppCommand, AppEvent, AppMode, AppState, Column, DEFAULT_PAGE_SIZE, DayBucket, FilterMode,
    FormField, FormMode, Grid, GridCommand, GridEvent, GridView, NavDirection, NavigationModel,
    Record, RecordDraft, RecordForm, RecordId, SortDirection, TimelineCommand, TimelineEvent,
    TimelineState, ViewKind, WidthBounds, group_by_day, record_columns,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info};

pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_millis(3000);
/// Column widths are kept in pixels; the terminal renders one cell per
/// this many pixels.
pub const PIXELS_PER_CELL: u16 = 8;
const COLUMN_SPACING: u16 = 1;
const SORT_MARK_ASC: &str = "▲";
const SORT_MARK_DESC: &str = "▼";
const FILTER_MARK: &str = "*";

/// Host-side operations the terminal session needs. The CLI backs this with
/// the record store; tests use an in-memory stand-in.
pub trait AppRuntime {
    fn records(&self) -> &[Record];
    fn create_record(&mut self, draft: RecordDraft) -> Result<RecordId>;
    fn update_record(&mut self, id: &RecordId, draft: RecordDraft) -> Result<bool>;
    fn select_record(&mut self, id: Option<RecordId>);
    fn selected_id(&self) -> Option<&RecordId>;
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    pub offset: UtcOffset,
    pub page_size: usize,
    /// 1-based page the grid opens on.
    pub initial_page: usize,
    pub width_bounds: WidthBounds,
    pub filter_mode: FilterMode,
    pub timeline_direction: SortDirection,
    pub navigation: NavigationModel,
    pub status_timeout: Duration,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            offset: UtcOffset::UTC,
            page_size: DEFAULT_PAGE_SIZE,
            initial_page: 1,
            width_bounds: WidthBounds::default(),
            filter_mode: FilterMode::default(),
            timeline_direction: SortDirection::Desc,
            navigation: NavigationModel::default(),
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptTarget {
    Column(String),
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptState {
    target: PromptTarget,
    buffer: String,
    original: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableCommand {
    MoveRow(isize),
    MoveColumn(isize),
    CycleSort,
    HideColumn,
    ShowAllColumns,
    EditColumnFilter,
    EditGlobalSearch,
    ToggleFilterMode,
    ClearFilters,
    NextPage,
    PrevPage,
    Widen,
    Narrow,
    SelectRow,
    CancelDrag,
}

struct ViewData {
    grid: Grid<Record>,
    timeline: TimelineState,
    row_cursor: usize,
    column_cursor: usize,
    prompt: Option<PromptState>,
    form: Option<RecordForm>,
    table_area: Rect,
    status_token: u64,
    offset: UtcOffset,
    status_timeout: Duration,
}

impl ViewData {
    fn new(options: &TuiOptions) -> Result<Self> {
        let grid = Grid::new(record_columns(options.offset), options.page_size)
            .context("build event grid")?
            .with_width_bounds(options.width_bounds)
            .with_filter_mode(options.filter_mode)
            .with_initial_page(options.initial_page);
        Ok(Self {
            grid,
            timeline: TimelineState::new(options.timeline_direction, options.navigation),
            row_cursor: 0,
            column_cursor: 0,
            prompt: None,
            form: None,
            table_area: Rect::default(),
            status_token: 0,
            offset: options.offset,
            status_timeout: options.status_timeout,
        })
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    let mut view_data = ViewData::new(&options)?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let (internal_tx, internal_rx) = mpsc::channel();
    info!(records = runtime.records().len(), "terminal session started");

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        match terminal.draw(|frame| render(frame, state, &*runtime, &view_data)) {
            Ok(completed) => view_data.table_area = layout_areas(completed.area).1,
            Err(error) => {
                result = Err(error).context("draw frame");
                break;
            }
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    end_drag(&mut view_data, runtime.records());
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    info!("terminal session ended");
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64, timeout: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(timeout);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn dispatch_app(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        if let AppEvent::StatusUpdated(_) = event {
            view_data.status_token = view_data.status_token.saturating_add(1);
            schedule_status_clear(internal_tx, view_data.status_token, view_data.status_timeout);
        }
    }
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    dispatch_app(
        state,
        view_data,
        internal_tx,
        AppCommand::SetStatus(message.into()),
    );
}

fn report_grid_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: &[GridEvent],
) {
    if let Some(message) = events.iter().rev().find_map(GridEvent::message) {
        emit_status(state, view_data, internal_tx, message);
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    // Esc cancels a header drag through the grid keymap; any other key
    // commits it before the key can switch view or open an overlay.
    if key.code != KeyCode::Esc {
        end_drag(view_data, runtime.records());
    }

    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.form.is_some() {
        handle_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Tab, _) => {
            dispatch_app(state, view_data, internal_tx, AppCommand::ToggleView);
            return false;
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            view_data.form = Some(RecordForm::add(runtime.now(), view_data.offset));
            dispatch_app(state, view_data, internal_tx, AppCommand::OpenAddForm);
            return false;
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            open_edit_form(state, runtime, view_data, internal_tx);
            return false;
        }
        _ => {}
    }

    match state.active_view {
        ViewKind::Grid => {
            if let Some(command) = table_command_for_key(key) {
                debug!(?command, "grid key");
                apply_table_command(state, runtime, view_data, internal_tx, command);
            }
        }
        ViewKind::Timeline => {
            if let Some(command) = timeline_command_for_key(key, view_data.timeline.direction) {
                debug!(?command, "timeline key");
                apply_timeline_command(state, runtime, view_data, internal_tx, command);
            }
        }
    }
    false
}

fn open_edit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let target = match state.active_view {
        ViewKind::Grid => cursor_row_id(view_data, runtime.records()),
        ViewKind::Timeline => view_data.timeline.active_id.clone(),
    }
    .or_else(|| runtime.selected_id().cloned());
    let Some(record) = target
        .as_ref()
        .and_then(|id| runtime.records().iter().find(|record| &record.id == id))
    else {
        emit_status(state, view_data, internal_tx, "select an event to edit");
        return;
    };

    let form = RecordForm::edit(record, view_data.offset);
    let id = record.id.clone();
    runtime.select_record(Some(id.clone()));
    view_data.form = Some(form);
    dispatch_app(state, view_data, internal_tx, AppCommand::OpenEditForm(id));
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.form = None;
            dispatch_app(state, view_data, internal_tx, AppCommand::CloseForm);
            emit_status(state, view_data, internal_tx, "edit canceled");
        }
        (KeyCode::Tab, _) | (KeyCode::Down, _) => form.focus_next(),
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => form.focus_prev(),
        (KeyCode::Backspace, _) => form.backspace(),
        (KeyCode::Enter, _) => submit_form(state, runtime, view_data, internal_tx),
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            form.push_char(ch);
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let offset = view_data.offset;
    let Some(form) = view_data.form.as_mut() else {
        return;
    };
    let mode = form.mode.clone();
    let draft = match form.submit(offset) {
        Ok(draft) => draft,
        Err(errors) => {
            let message = errors
                .first_invalid_field()
                .and_then(|field| errors.get(field))
                .map(|error| error.to_string())
                .unwrap_or_else(|| errors.to_string());
            emit_status(state, view_data, internal_tx, message);
            return;
        }
    };

    let outcome = match mode {
        FormMode::Add => runtime.create_record(draft).map(|id| {
            runtime.select_record(Some(id));
            "event created"
        }),
        FormMode::Edit(id) => runtime.update_record(&id, draft).map(|found| {
            if found {
                "event updated"
            } else {
                "event no longer exists"
            }
        }),
    };
    match outcome {
        Ok(message) => {
            view_data.form = None;
            dispatch_app(state, view_data, internal_tx, AppCommand::CloseForm);
            emit_status(state, view_data, internal_tx, message);
            clamp_cursors(view_data, runtime.records());
            regroup_timeline(view_data, runtime.records());
        }
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("save failed: {error:#}"),
            );
        }
    }
}

fn handle_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(mut prompt) = view_data.prompt.take() else {
        return;
    };
    let rows = runtime.records();
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            apply_prompt(view_data, rows, &prompt.target, &prompt.original);
            clamp_cursors(view_data, rows);
            emit_status(state, view_data, internal_tx, "filter canceled");
            return;
        }
        (KeyCode::Enter, _) => {
            let matched = view_data.grid.view(rows).total_filtered_count;
            clamp_cursors(view_data, rows);
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{matched} matching"),
            );
            return;
        }
        (KeyCode::Backspace, _) => {
            prompt.buffer.pop();
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.buffer.clear();
        }
        (KeyCode::Char(ch), modifiers)
            if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
        {
            prompt.buffer.push(ch);
        }
        _ => {}
    }
    apply_prompt(view_data, rows, &prompt.target, &prompt.buffer);
    view_data.row_cursor = 0;
    view_data.prompt = Some(prompt);
}

fn apply_prompt(view_data: &mut ViewData, rows: &[Record], target: &PromptTarget, value: &str) {
    let command = match target {
        PromptTarget::Column(column_id) => GridCommand::SetColumnFilter {
            column_id: column_id.clone(),
            value: value.to_owned(),
        },
        PromptTarget::Global => GridCommand::SetGlobalQuery(value.to_owned()),
    };
    view_data.grid.dispatch(rows, command);
}

fn table_command_for_key(key: KeyEvent) -> Option<TableCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(TableCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(TableCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(TableCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) => Some(TableCommand::MoveColumn(1)),
        (KeyCode::Char('s'), KeyModifiers::NONE) => Some(TableCommand::CycleSort),
        (KeyCode::Char('x'), KeyModifiers::NONE) => Some(TableCommand::HideColumn),
        (KeyCode::Char('X'), _) => Some(TableCommand::ShowAllColumns),
        (KeyCode::Char('/'), _) => Some(TableCommand::EditColumnFilter),
        (KeyCode::Char('g'), KeyModifiers::NONE) => Some(TableCommand::EditGlobalSearch),
        (KeyCode::Char('m'), KeyModifiers::NONE) => Some(TableCommand::ToggleFilterMode),
        (KeyCode::Char('c'), KeyModifiers::NONE) => Some(TableCommand::ClearFilters),
        (KeyCode::Char('n'), KeyModifiers::NONE) | (KeyCode::PageDown, _) => {
            Some(TableCommand::NextPage)
        }
        (KeyCode::Char('p'), KeyModifiers::NONE) | (KeyCode::PageUp, _) => {
            Some(TableCommand::PrevPage)
        }
        (KeyCode::Char('>'), _) => Some(TableCommand::Widen),
        (KeyCode::Char('<'), _) => Some(TableCommand::Narrow),
        (KeyCode::Enter, _) => Some(TableCommand::SelectRow),
        (KeyCode::Esc, _) => Some(TableCommand::CancelDrag),
        _ => None,
    }
}

fn apply_table_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TableCommand,
) {
    if command == TableCommand::SelectRow {
        select_cursor_row(state, runtime, view_data, internal_tx);
        return;
    }

    let rows = runtime.records();
    let column_id = cursor_column_id(view_data);
    let step = i32::from(view_data.grid.width_bounds().step());
    let grid_command = match command {
        TableCommand::MoveRow(delta) => {
            move_row(view_data, rows, delta);
            None
        }
        TableCommand::MoveColumn(delta) => {
            move_column(view_data, delta);
            None
        }
        TableCommand::CycleSort => column_id.map(GridCommand::ToggleSort),
        TableCommand::HideColumn => column_id.map(|column_id| GridCommand::SetColumnVisibility {
            column_id,
            visible: false,
        }),
        TableCommand::ShowAllColumns => Some(GridCommand::ShowAllColumns),
        TableCommand::EditColumnFilter => {
            let Some(column_id) = column_id else {
                return;
            };
            let filterable = view_data
                .grid
                .column(&column_id)
                .is_some_and(Column::is_filterable);
            if !filterable {
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("{column_id} is not filterable"),
                );
                return;
            }
            let mut events = view_data
                .grid
                .dispatch(rows, GridCommand::SetFilterMode(FilterMode::Columns));
            let original = view_data
                .grid
                .state()
                .column_filters
                .get(&column_id)
                .cloned()
                .unwrap_or_default();
            view_data.prompt = Some(PromptState {
                target: PromptTarget::Column(column_id),
                buffer: original.clone(),
                original,
            });
            events.retain(|event| !matches!(event, GridEvent::FilterModeChanged(_)));
            report_grid_events(state, view_data, internal_tx, &events);
            None
        }
        TableCommand::EditGlobalSearch => {
            view_data
                .grid
                .dispatch(rows, GridCommand::SetFilterMode(FilterMode::Global));
            let original = view_data.grid.state().global_query.clone();
            view_data.prompt = Some(PromptState {
                target: PromptTarget::Global,
                buffer: original.clone(),
                original,
            });
            None
        }
        TableCommand::ToggleFilterMode => {
            let next = match view_data.grid.state().filter_mode {
                FilterMode::Columns => FilterMode::Global,
                FilterMode::Global => FilterMode::Columns,
            };
            Some(GridCommand::SetFilterMode(next))
        }
        TableCommand::ClearFilters => Some(GridCommand::ClearFilters),
        TableCommand::NextPage => Some(GridCommand::NextPage),
        TableCommand::PrevPage => Some(GridCommand::PrevPage),
        TableCommand::Widen => column_id.map(|column_id| GridCommand::ResizeColumn {
            column_id,
            delta: step,
        }),
        TableCommand::Narrow => column_id.map(|column_id| GridCommand::ResizeColumn {
            column_id,
            delta: -step,
        }),
        TableCommand::CancelDrag => Some(GridCommand::CancelResize),
        TableCommand::SelectRow => None,
    };

    if let Some(grid_command) = grid_command {
        let events = view_data.grid.dispatch(rows, grid_command);
        if events
            .iter()
            .any(|event| matches!(event, GridEvent::PageChanged(_)))
        {
            view_data.row_cursor = 0;
        }
        clamp_cursors(view_data, rows);
        report_grid_events(state, view_data, internal_tx, &events);
    }
}

fn select_cursor_row<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = cursor_row_id(view_data, runtime.records()) else {
        return;
    };
    runtime.select_record(Some(id.clone()));
    emit_status(state, view_data, internal_tx, format!("selected {id}"));
}

fn cursor_column_id(view_data: &ViewData) -> Option<String> {
    view_data
        .grid
        .visible_columns()
        .get(view_data.column_cursor)
        .map(|column| column.id().to_owned())
}

fn cursor_row_id(view_data: &ViewData, rows: &[Record]) -> Option<RecordId> {
    view_data
        .grid
        .view(rows)
        .page_rows
        .get(view_data.row_cursor)
        .map(|record| record.id.clone())
}

fn move_row(view_data: &mut ViewData, rows: &[Record], delta: isize) {
    let len = view_data.grid.view(rows).page_rows.len();
    if len == 0 {
        view_data.row_cursor = 0;
        return;
    }
    let next = view_data.row_cursor as isize + delta;
    view_data.row_cursor = next.clamp(0, len as isize - 1) as usize;
}

fn move_column(view_data: &mut ViewData, delta: isize) {
    let len = view_data.grid.visible_columns().len();
    if len == 0 {
        return;
    }
    let next = view_data.column_cursor as isize + delta;
    view_data.column_cursor = next.clamp(0, len as isize - 1) as usize;
}

fn clamp_cursors(view_data: &mut ViewData, rows: &[Record]) {
    let columns = view_data.grid.visible_columns().len();
    view_data.column_cursor = view_data.column_cursor.min(columns.saturating_sub(1));
    let page_rows = view_data.grid.view(rows).page_rows.len();
    view_data.row_cursor = view_data.row_cursor.min(page_rows.saturating_sub(1));
}

fn timeline_command_for_key(key: KeyEvent, direction: SortDirection) -> Option<TimelineCommand> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(TimelineCommand::Move(NavDirection::Up)),
        KeyCode::Down | KeyCode::Char('j') => Some(TimelineCommand::Move(NavDirection::Down)),
        KeyCode::Left | KeyCode::Char('h') => Some(TimelineCommand::Move(NavDirection::Left)),
        KeyCode::Right | KeyCode::Char('l') => Some(TimelineCommand::Move(NavDirection::Right)),
        KeyCode::Enter => Some(TimelineCommand::Activate),
        KeyCode::Char('r') => Some(TimelineCommand::SetDirection(direction.flip())),
        _ => None,
    }
}

fn apply_timeline_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: TimelineCommand,
) {
    let buckets = timeline_buckets(view_data, runtime.records());
    for event in view_data.timeline.dispatch(&buckets, command) {
        match event {
            TimelineEvent::Selected(id) => {
                runtime.select_record(Some(id.clone()));
                emit_status(state, view_data, internal_tx, format!("selected {id}"));
            }
            TimelineEvent::DirectionChanged(direction) => {
                regroup_timeline(view_data, runtime.records());
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    direction_label(direction),
                );
            }
            TimelineEvent::Focused(_) | TimelineEvent::Announced(_) => {}
        }
    }
}

fn timeline_buckets(view_data: &ViewData, rows: &[Record]) -> Vec<DayBucket> {
    group_by_day(rows, view_data.timeline.direction, view_data.offset)
}

/// Re-derives the focused item's announcement after the buckets changed shape.
fn regroup_timeline(view_data: &mut ViewData, rows: &[Record]) {
    let buckets = timeline_buckets(view_data, rows);
    view_data.timeline.dispatch(&buckets, TimelineCommand::Regroup);
}

fn direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Desc => "newest first",
        SortDirection::Asc => "oldest first",
    }
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    // Release always ends a drag, whatever view or overlay is showing now.
    if mouse.kind == MouseEventKind::Up(MouseButton::Left) {
        end_drag(view_data, runtime.records());
        return;
    }
    if state.active_view != ViewKind::Grid
        || !state.is_browsing()
        || view_data.prompt.is_some()
    {
        return;
    }
    let x = cells_to_pixels(mouse.column);
    let command = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            header_border_at(&view_data.grid, view_data.table_area, mouse.column, mouse.row)
                .map(|column_id| GridCommand::BeginResize {
                    column_id,
                    anchor_x: x,
                })
        }
        MouseEventKind::Drag(MouseButton::Left) => Some(GridCommand::DragResize { x }),
        _ => None,
    };
    if let Some(command) = command {
        let events = view_data.grid.dispatch(runtime.records(), command);
        report_grid_events(state, view_data, internal_tx, &events);
    }
}

fn end_drag(view_data: &mut ViewData, rows: &[Record]) {
    if view_data.grid.state().drag.column_id().is_some() {
        view_data.grid.dispatch(rows, GridCommand::EndResize);
    }
}

fn width_cells(width: u16) -> u16 {
    (width / PIXELS_PER_CELL).max(1)
}

fn cells_to_pixels(cells: u16) -> i32 {
    i32::from(cells) * i32::from(PIXELS_PER_CELL)
}

/// Column whose right border sits under `(x, y)` on the header row.
fn header_border_at(grid: &Grid<Record>, area: Rect, x: u16, y: u16) -> Option<String> {
    if y != area.y.saturating_add(1) {
        return None;
    }
    let mut left = area.x.saturating_add(1);
    for column in grid.visible_columns() {
        let right = left.saturating_add(width_cells(grid.column_width(column.id())));
        if x == right || x.saturating_add(1) == right {
            return Some(column.id().to_owned());
        }
        left = right.saturating_add(COLUMN_SPACING);
    }
    None
}

fn layout_areas(area: Rect) -> (Rect, Rect, Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);
    (layout[0], layout[1], layout[2])
}

fn render<R: AppRuntime>(
    frame: &mut ratatui::Frame<'_>,
    state: &AppState,
    runtime: &R,
    view_data: &ViewData,
) {
    let (header, body, footer) = layout_areas(frame.area());

    let selected = ViewKind::ALL
        .iter()
        .position(|view| *view == state.active_view)
        .unwrap_or(0);
    let tabs = Tabs::new(
        ViewKind::ALL
            .iter()
            .map(|view| view.label().to_owned())
            .collect::<Vec<String>>(),
    )
    .block(Block::default().title("eventview").borders(Borders::ALL))
    .style(Style::default().fg(Color::White))
    .highlight_style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .select(selected);
    frame.render_widget(tabs, header);

    match state.active_view {
        ViewKind::Grid => render_grid(frame, body, runtime, view_data),
        ViewKind::Timeline => render_timeline(frame, body, runtime, view_data),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, footer);

    if let Some(form) = &view_data.form {
        render_form(frame, form);
    }
}

fn render_grid<R: AppRuntime>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    runtime: &R,
    view_data: &ViewData,
) {
    let grid = &view_data.grid;
    let view = grid.view(runtime.records());
    let widths = view
        .visible_columns
        .iter()
        .map(|column| Constraint::Length(width_cells(grid.column_width(column.id()))))
        .collect::<Vec<_>>();

    let header_cells = view
        .visible_columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut style = Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD);
            if index == view_data.column_cursor {
                style = style.fg(Color::Cyan);
            }
            Cell::from(header_label(grid, column)).style(style)
        });
    let header = Row::new(header_cells);

    let selected_id = runtime.selected_id();
    let rows = view.page_rows.iter().enumerate().map(|(row_index, record)| {
        let cursor_row = row_index == view_data.row_cursor;
        let cells = view
            .visible_columns
            .iter()
            .enumerate()
            .map(|(column_index, column)| {
                let mut style = Style::default();
                if selected_id == Some(&record.id) {
                    style = style.fg(Color::Yellow);
                }
                if cursor_row {
                    style = style.bg(Color::DarkGray);
                }
                if cursor_row && column_index == view_data.column_cursor {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(column.render(record)).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let block = Block::default()
        .title(grid_title(&view, grid.state().filter_mode))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .block(block);
    // The selected row drives the table's scroll offset so the cursor row
    // stays on screen when the page is taller than the body.
    let mut table_state = TableState::default().with_selected(Some(view_data.row_cursor));
    frame.render_stateful_widget(table, area, &mut table_state);

    if view.page_rows.is_empty() && inner.height > 1 {
        let message = if view.total_count == 0 {
            "no events"
        } else {
            "no matching events"
        };
        let below_header = Rect {
            y: inner.y + 1,
            height: inner.height - 1,
            ..inner
        };
        frame.render_widget(
            Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
            below_header,
        );
    }
}

fn header_label(grid: &Grid<Record>, column: &Column<Record>) -> String {
    let mut label = column.label().to_owned();
    match grid.state().sort_direction_for(column.id()) {
        Some(SortDirection::Asc) => {
            label.push(' ');
            label.push_str(SORT_MARK_ASC);
        }
        Some(SortDirection::Desc) => {
            label.push(' ');
            label.push_str(SORT_MARK_DESC);
        }
        None => {}
    }
    if grid.state().filter_mode == FilterMode::Columns
        && grid.state().column_filters.contains_key(column.id())
    {
        label.push_str(FILTER_MARK);
    }
    label
}

fn grid_title(view: &GridView<'_, '_, Record>, mode: FilterMode) -> String {
    format!(
        "events {}/{} | page {}/{} | filter {}",
        view.total_filtered_count,
        view.total_count,
        view.current_page,
        view.total_pages,
        mode.as_str()
    )
}

fn render_timeline<R: AppRuntime>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    runtime: &R,
    view_data: &ViewData,
) {
    let buckets = timeline_buckets(view_data, runtime.records());
    let (lines, active_line) = timeline_lines(
        &buckets,
        view_data.timeline.active_id.as_ref(),
        runtime.selected_id(),
    );
    let visible_height = usize::from(area.height.saturating_sub(2)).max(1);
    let scroll = active_line
        .map(|line| line.saturating_sub(visible_height - 1))
        .unwrap_or(0);
    let body = Paragraph::new(lines)
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
        .block(
            Block::default()
                .title(format!(
                    "timeline | {}",
                    direction_label(view_data.timeline.direction)
                ))
                .borders(Borders::ALL),
        );
    frame.render_widget(body, area);
}

fn timeline_lines<'a>(
    buckets: &'a [DayBucket],
    active_id: Option<&RecordId>,
    selected_id: Option<&RecordId>,
) -> (Vec<Line<'a>>, Option<usize>) {
    if buckets.is_empty() {
        return (vec![Line::from("no events")], None);
    }
    let mut lines = Vec::new();
    let mut active_line = None;
    for bucket in buckets {
        lines.push(Line::styled(
            format!("{} ({})", bucket.label, bucket.len()),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));
        for item in &bucket.items {
            let severity = item
                .severity
                .map(|severity| format!(" [{}]", severity.as_str()))
                .unwrap_or_default();
            let mut style = Style::default();
            if selected_id == Some(&item.id) {
                style = style.fg(Color::Yellow);
            }
            if active_id == Some(&item.id) {
                active_line = Some(lines.len());
                style = Style::default().fg(Color::Black).bg(Color::Cyan);
            }
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("{}  {}{}", time_label(item.timestamp), item.title, severity),
                    style,
                ),
            ]));
        }
    }
    (lines, active_line)
}

fn render_form(frame: &mut ratatui::Frame<'_>, form: &RecordForm) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);
    let title = match form.mode {
        FormMode::Add => "add event",
        FormMode::Edit(_) => "edit event",
    };
    let body = Paragraph::new(form_lines(form))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(body, area);
}

fn form_lines(form: &RecordForm) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for field in FormField::ALL {
        let focused = form.focus == field;
        let marker = if focused { "›" } else { " " };
        let value = match field {
            FormField::Title => form.title.clone(),
            FormField::When => form.when.clone(),
            FormField::Severity => form
                .severity
                .map_or("none", |severity| severity.as_str())
                .to_owned(),
            FormField::Description => form.description.clone(),
        };
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker} {:<12}", field.label()), label_style),
            Span::raw(value),
        ]));
        if let Some(error) = form.errors().get(field) {
            lines.push(Line::styled(
                format!("    {error}"),
                Style::default().fg(Color::Red),
            ));
        }
    }
    lines
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if let Some(prompt) = &view_data.prompt {
        let label = match &prompt.target {
            PromptTarget::Column(column_id) => format!("filter {column_id}"),
            PromptTarget::Global => "search".to_owned(),
        };
        return format!("{label}: {}_ | enter keep | esc revert", prompt.buffer);
    }

    let mode = match state.mode {
        AppMode::Browse => "BROWSE",
        AppMode::Form(_) => "FORM",
    };
    let hints = match (&state.mode, state.active_view) {
        (AppMode::Form(_), _) => "tab field | enter save | esc cancel",
        (AppMode::Browse, ViewKind::Grid) => {
            "h/l j/k | s sort | / filter g search m mode c clear | x/X cols | n/p page | </> width | a/e | tab view | ctrl+q"
        }
        (AppMode::Browse, ViewKind::Timeline) => {
            "arrows move | enter select | r reverse | a/e | tab view | ctrl+q"
        }
    };
    let announcement = &view_data.timeline.announcement;
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None if state.active_view == ViewKind::Timeline && !announcement.is_empty() => {
            format!("{mode} | {announcement} | {hints}")
        }
        None => format!("{mode} | {hints}"),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
