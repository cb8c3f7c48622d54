// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::{OffsetDateTime, UtcOffset};

use crate::dates::{datetime_input_value, parse_datetime_input};
use crate::model::{FormMode, Record, RecordDraft, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    When,
    Severity,
    Description,
}

impl FormField {
    pub const ALL: [Self; 4] = [Self::Title, Self::When, Self::Severity, Self::Description];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::When => "Date & Time",
            Self::Severity => "Severity",
            Self::Description => "Description",
        }
    }

    fn rotate(self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0) as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    TitleRequired,
    WhenRequired,
    WhenInvalid,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleRequired => f.write_str("Title is required."),
            Self::WhenRequired => f.write_str("Date and time are required."),
            Self::WhenInvalid => f.write_str("Please enter a valid date and time."),
        }
    }
}

impl std::error::Error for FieldError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub title: Option<FieldError>,
    pub when: Option<FieldError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.when.is_none()
    }

    pub fn get(&self, field: FormField) -> Option<FieldError> {
        match field {
            FormField::Title => self.title,
            FormField::When => self.when,
            FormField::Severity | FormField::Description => None,
        }
    }

    /// Field that should receive focus after a failed submit.
    pub fn first_invalid_field(&self) -> Option<FormField> {
        FormField::ALL
            .into_iter()
            .find(|field| self.get(*field).is_some())
    }

    fn clear(&mut self, field: FormField) {
        match field {
            FormField::Title => self.title = None,
            FormField::When => self.when = None,
            FormField::Severity | FormField::Description => {}
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages = [self.title, self.when]
            .into_iter()
            .flatten()
            .map(|error| error.to_string())
            .collect::<Vec<_>>();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for FormErrors {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordForm {
    pub mode: FormMode,
    pub title: String,
    /// Local `YYYY-MM-DDTHH:MM` text as typed.
    pub when: String,
    pub severity: Option<Severity>,
    pub description: String,
    pub focus: FormField,
    errors: FormErrors,
}

impl RecordForm {
    pub fn add(now: OffsetDateTime, offset: UtcOffset) -> Self {
        Self {
            mode: FormMode::Add,
            title: String::new(),
            when: datetime_input_value(now, offset),
            severity: None,
            description: String::new(),
            focus: FormField::Title,
            errors: FormErrors::default(),
        }
    }

    pub fn edit(record: &Record, offset: UtcOffset) -> Self {
        let draft = record.to_draft();
        Self {
            mode: FormMode::Edit(record.id.clone()),
            title: draft.title,
            when: datetime_input_value(draft.timestamp, offset),
            severity: draft.severity,
            description: draft.description.unwrap_or_default(),
            focus: FormField::Title,
            errors: FormErrors::default(),
        }
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.rotate(1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.rotate(-1);
    }

    pub fn set_text(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Title => self.title = value,
            FormField::When => self.when = value,
            FormField::Description => self.description = value,
            FormField::Severity => return,
        }
        self.errors.clear(field);
    }

    /// Appends to the focused text field; on the severity field any key
    /// cycles the value instead.
    pub fn push_char(&mut self, ch: char) {
        match self.focus {
            FormField::Severity => self.cycle_severity(),
            field => {
                if let Some(text) = self.text_mut(field) {
                    text.push(ch);
                }
                self.errors.clear(field);
            }
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focus;
        if let Some(text) = self.text_mut(field) {
            text.pop();
            self.errors.clear(field);
        }
    }

    pub fn cycle_severity(&mut self) {
        self.severity = Severity::cycle(self.severity);
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Title => Some(&mut self.title),
            FormField::When => Some(&mut self.when),
            FormField::Description => Some(&mut self.description),
            FormField::Severity => None,
        }
    }

    /// Validates every field; on failure the errors are kept on the form and
    /// focus moves to the first invalid field.
    pub fn submit(&mut self, offset: UtcOffset) -> Result<RecordDraft, FormErrors> {
        let mut errors = FormErrors::default();
        if self.title.trim().is_empty() {
            errors.title = Some(FieldError::TitleRequired);
        }
        let timestamp = if self.when.trim().is_empty() {
            errors.when = Some(FieldError::WhenRequired);
            None
        } else {
            let parsed = parse_datetime_input(&self.when, offset);
            if parsed.is_none() {
                errors.when = Some(FieldError::WhenInvalid);
            }
            parsed
        };

        self.errors = errors;
        if let Some(field) = errors.first_invalid_field() {
            self.focus = field;
            return Err(errors);
        }
        let Some(timestamp) = timestamp else {
            return Err(errors);
        };

        let description = self.description.trim();
        Ok(RecordDraft {
            title: self.title.trim().to_owned(),
            timestamp,
            description: (!description.is_empty()).then(|| description.to_owned()),
            severity: self.severity,
        })
    }
}
