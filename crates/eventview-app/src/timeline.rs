// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::debug;

use crate::grouping::DayBucket;
use crate::ids::RecordId;
use crate::model::SortDirection;
use crate::navigation::{
    NavDirection, NavigationModel, Position, announcement, find_position, item_at, next_position,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineCommand {
    Focus(RecordId),
    Move(NavDirection),
    Activate,
    SetDirection(SortDirection),
    /// The buckets were rebuilt (new direction or edited records); re-derive
    /// the announcement for the focused item.
    Regroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    Focused(RecordId),
    Announced(String),
    Selected(RecordId),
    DirectionChanged(SortDirection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineState {
    pub direction: SortDirection,
    pub model: NavigationModel,
    pub active_id: Option<RecordId>,
    pub announcement: String,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self::new(SortDirection::Desc, NavigationModel::default())
    }
}

impl TimelineState {
    pub fn new(direction: SortDirection, model: NavigationModel) -> Self {
        Self {
            direction,
            model,
            active_id: None,
            announcement: String::new(),
        }
    }

    pub fn active_position(&self, buckets: &[DayBucket]) -> Option<Position> {
        self.active_id
            .as_ref()
            .and_then(|id| find_position(buckets, id))
    }

    pub fn dispatch(
        &mut self,
        buckets: &[DayBucket],
        command: TimelineCommand,
    ) -> Vec<TimelineEvent> {
        match command {
            TimelineCommand::Focus(id) => self.focus(buckets, id),
            TimelineCommand::Move(direction) => {
                let target = match self.active_position(buckets) {
                    Some(position) => next_position(buckets, position, direction, self.model),
                    // Nothing focused yet: the first arrow lands on the first item.
                    None => Some(Position::new(0, 0)),
                };
                match target.and_then(|position| item_at(buckets, position)) {
                    Some(item) => {
                        let id = item.id.clone();
                        self.focus(buckets, id)
                    }
                    None => Vec::new(),
                }
            }
            TimelineCommand::Activate => match &self.active_id {
                Some(id) if find_position(buckets, id).is_some() => {
                    debug!(id = %id, "timeline item selected");
                    vec![TimelineEvent::Selected(id.clone())]
                }
                _ => Vec::new(),
            },
            TimelineCommand::SetDirection(direction) => {
                if direction == self.direction {
                    return Vec::new();
                }
                self.direction = direction;
                vec![TimelineEvent::DirectionChanged(direction)]
            }
            TimelineCommand::Regroup => self.regroup(buckets),
        }
    }

    fn regroup(&mut self, buckets: &[DayBucket]) -> Vec<TimelineEvent> {
        let position = self.active_position(buckets);
        if position.is_none() {
            self.active_id = None;
        }
        let text = announcement(buckets, position);
        if text == self.announcement {
            return Vec::new();
        }
        self.announcement = text;
        debug!(?position, "timeline announcement refreshed");
        vec![TimelineEvent::Announced(self.announcement.clone())]
    }

    fn focus(&mut self, buckets: &[DayBucket], id: RecordId) -> Vec<TimelineEvent> {
        if self.active_id.as_ref() == Some(&id) {
            return Vec::new();
        }
        let Some(position) = find_position(buckets, &id) else {
            return Vec::new();
        };
        self.announcement = announcement(buckets, Some(position));
        self.active_id = Some(id.clone());
        debug!(id = %id, ?position, "timeline focus moved");
        vec![
            TimelineEvent::Focused(id),
            TimelineEvent::Announced(self.announcement.clone()),
        ]
    }
}
