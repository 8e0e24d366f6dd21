// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Category, Task};

/// A task as returned by the API and handed to the templates, with the
/// display labels and the derived `is_overdue` flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskResponse {
    #[serde(flatten)]
    pub task: Task,
    pub status_display: String,
    pub priority_display: String,
    pub is_overdue: bool,
}

impl TaskResponse {
    pub fn from_model(task: Task, today: NaiveDate) -> Self {
        Self {
            status_display: task.status.label().to_string(),
            priority_display: task.priority.label().to_string(),
            is_overdue: task.is_overdue(today),
            task,
        }
    }

    pub fn from_models(tasks: Vec<Task>, today: NaiveDate) -> Vec<Self> {
        tasks
            .into_iter()
            .map(|task| Self::from_model(task, today))
            .collect()
    }
}

/// A category with the number of tasks filed under it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryResponse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub category: Category,
    pub task_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PriorityCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryCount {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub count: i64,
}

/// Aggregate numbers shown on the dashboard and served by `/api/tasks/stats/`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskStats {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
    pub overdue: i64,
    /// Percentage of done tasks, rounded to one decimal.
    pub completion_rate: f64,
    pub by_priority: PriorityCounts,
    pub by_category: Vec<CategoryCount>,
    pub uncategorized: i64,
}

impl TaskStats {
    pub fn completion_rate(done: i64, total: i64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (done as f64 * 1000.0 / total as f64).round() / 10.0
    }
}

/// Page-number pagination envelope.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Total number of items across all pages.
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}
