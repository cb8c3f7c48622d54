// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, FormMode, RecordId, ViewKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_view: ViewKind,
    pub mode: AppMode,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_view: ViewKind::Grid,
            mode: AppMode::Browse,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    ToggleView,
    OpenAddForm,
    OpenEditForm(RecordId),
    CloseForm,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ViewChanged(ViewKind),
    ModeChanged(AppMode),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::ToggleView => {
                let views = ViewKind::ALL;
                let current = views
                    .iter()
                    .position(|view| *view == self.active_view)
                    .unwrap_or(0);
                self.active_view = views[(current + 1) % views.len()];
                vec![
                    AppEvent::ViewChanged(self.active_view),
                    self.set_status(self.active_view.label()),
                ]
            }
            AppCommand::OpenAddForm => self.set_mode(AppMode::Form(FormMode::Add)),
            AppCommand::OpenEditForm(id) => self.set_mode(AppMode::Form(FormMode::Edit(id))),
            AppCommand::CloseForm => {
                if self.mode == AppMode::Browse {
                    return Vec::new();
                }
                self.set_mode(AppMode::Browse)
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                if self.status_line.take().is_none() {
                    return Vec::new();
                }
                vec![AppEvent::StatusCleared]
            }
        }
    }

    pub fn is_browsing(&self) -> bool {
        self.mode == AppMode::Browse
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(self.mode.clone())]
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}
