// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Request payloads accepted by the API and the HTML forms.
//!
//! Database models (`Task`, `Category`) are kept apart from what clients may
//! send: ids and timestamps are never writable, and every payload goes through
//! `check()` before it reaches the database.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationErrors};

use crate::models::{Category, Priority, Task, TaskStatus};

pub const TITLE_MAX_LEN: u64 = 200;
pub const CATEGORY_NAME_MAX_LEN: u64 = 100;

/// Validation messages keyed by field name, e.g. `{"title": ["This field may not be blank."]}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok(())` when no error was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Lets a patch tell an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

const NOT_NULL: &str = "This field may not be null.";

/// Resolves a patched field that has no `null` state: absent keeps `current`,
/// `null` records an error.
fn not_null<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<Option<T>>,
    current: impl FnOnce() -> T,
) -> T {
    match value {
        Some(Some(value)) => value,
        Some(None) => {
            errors.add(field, NOT_NULL);
            current()
        }
        None => current(),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// --- Categories ---

/// Body of `POST`/`PUT /api/categories/` and of the admin category form.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CategoryPayload {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters."))]
    pub name: String,
    /// Assigned from the palette when left out.
    #[serde(default)]
    pub color: Option<String>,
}

impl CategoryPayload {
    /// Trims the input and runs every field check.
    pub fn check(mut self) -> Result<CategoryPayload, FieldErrors> {
        self.name = self.name.trim().to_string();
        self.color = blank_to_none(self.color);

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(&e),
        };
        if let Some(color) = &self.color {
            if !is_hex_color(color) {
                errors.add("color", "Enter a valid hex color, e.g. #1f77b4.");
            }
        }
        errors.into_result().map(|()| self)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CategoryPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub name: Option<Option<String>>,
    pub color: Option<String>,
}

impl CategoryPatch {
    /// Fills the missing fields from the stored category. An explicit
    /// `null` name is an error.
    pub fn apply_to(self, category: &Category) -> Result<CategoryPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = not_null(&mut errors, "name", self.name, || category.name.clone());
        errors.into_result()?;
        Ok(CategoryPayload {
            name,
            color: Some(self.color.unwrap_or_else(|| category.color.clone())),
        })
    }
}

// --- Tasks ---

/// Body of `POST`/`PUT /api/tasks/`. The HTML form is converted into this
/// structure before validation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct TaskPayload {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters."))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters."))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: Priority,

    /// Category id.
    #[serde(default)]
    pub category: Option<i64>,

    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl TaskPayload {
    /// Trims the input and runs every field check that doesn't need the database.
    pub fn check(mut self) -> Result<TaskPayload, FieldErrors> {
        self.title = self.title.trim().to_string();
        self.description = blank_to_none(self.description);

        match self.validate() {
            Ok(()) => Ok(self),
            Err(e) => Err(FieldErrors::from(&e)),
        }
    }
}

/// Body of `PATCH /api/tasks/{id}/`.
///
/// Every field tells an absent key from an explicit `null`; only the
/// nullable ones accept the latter.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TaskPatch {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub status: Option<Option<TaskStatus>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub priority: Option<Option<Priority>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    /// Fills the missing fields from the stored task.
    pub fn apply_to(self, task: &Task) -> Result<TaskPayload, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = not_null(&mut errors, "title", self.title, || task.title.clone());
        let status = not_null(&mut errors, "status", self.status, || task.status);
        let priority = not_null(&mut errors, "priority", self.priority, || task.priority);
        errors.into_result()?;

        Ok(TaskPayload {
            title,
            description: self.description.unwrap_or_else(|| task.description.clone()),
            status,
            priority,
            category: self.category.unwrap_or(task.category_id),
            due_date: self.due_date.unwrap_or(task.due_date),
        })
    }
}

// --- Listing ---

/// Sort orders accepted by `?ordering=`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOrdering {
    /// Priority high to low, then nearest due date, then newest.
    #[default]
    Default,
    CreatedAsc,
    CreatedDesc,
    DueDateAsc,
    DueDateDesc,
    PriorityAsc,
    PriorityDesc,
    TitleAsc,
    TitleDesc,
}

impl TaskOrdering {
    /// Unknown values fall back to the default order.
    pub fn parse(value: &str) -> TaskOrdering {
        match value {
            "created_at" => TaskOrdering::CreatedAsc,
            "-created_at" => TaskOrdering::CreatedDesc,
            "due_date" => TaskOrdering::DueDateAsc,
            "-due_date" => TaskOrdering::DueDateDesc,
            "priority" => TaskOrdering::PriorityAsc,
            "-priority" => TaskOrdering::PriorityDesc,
            "title" => TaskOrdering::TitleAsc,
            "-title" => TaskOrdering::TitleDesc,
            _ => TaskOrdering::Default,
        }
    }
}

/// Restricts a listing to one category, or to tasks without any.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Id(i64),
    Uncategorized,
}

/// Query string of the task listings (`/tasks/` and `/api/tasks/`).
///
/// Values stay as raw strings so that the empty values an HTML filter form
/// submits (`?status=&priority=`) mean "no filter" instead of a parse error.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    pub overdue: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Parsed, typed form of [`TaskFilter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskCriteria {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub category: Option<CategoryFilter>,
    pub search: Option<String>,
    pub overdue: Option<bool>,
    pub ordering: TaskOrdering,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl TaskFilter {
    pub fn criteria(&self) -> Result<TaskCriteria, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut criteria = TaskCriteria::default();

        if let Some(status) = non_empty(&self.status) {
            match status.parse() {
                Ok(s) => criteria.status = Some(s),
                Err(e) => errors.add("status", e),
            }
        }
        if let Some(priority) = non_empty(&self.priority) {
            match priority.parse() {
                Ok(p) => criteria.priority = Some(p),
                Err(e) => errors.add("priority", e),
            }
        }
        if let Some(category) = non_empty(&self.category) {
            if category == "none" {
                criteria.category = Some(CategoryFilter::Uncategorized);
            } else {
                match category.parse::<i64>() {
                    Ok(id) => criteria.category = Some(CategoryFilter::Id(id)),
                    Err(_) => errors.add("category", "Enter a category id or \"none\"."),
                }
            }
        }
        criteria.search = non_empty(&self.q).map(str::to_string);
        if let Some(overdue) = non_empty(&self.overdue) {
            match overdue.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => criteria.overdue = Some(true),
                "false" | "0" | "no" | "off" => criteria.overdue = Some(false),
                _ => errors.add("overdue", "Enter true or false."),
            }
        }
        criteria.ordering = non_empty(&self.ordering)
            .map(TaskOrdering::parse)
            .unwrap_or_default();

        errors.into_result().map(|()| criteria)
    }

    /// Non-empty filter parameters, without the pagination ones.
    /// Used to build pagination links that keep the current filters.
    pub fn filter_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("status", &self.status),
            ("priority", &self.priority),
            ("category", &self.category),
            ("q", &self.q),
            ("overdue", &self.overdue),
            ("ordering", &self.ordering),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_empty(value).map(|v| (key, v.to_string())))
        .collect()
    }
}
