// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Types shared between the taskboard server and its clients: the database
//! models, the request payloads with their validation rules, and the
//! response shapes returned by the JSON API.

pub mod models;
pub mod payloads;
pub mod responses;

pub use models::{Category, Priority, Task, TaskStatus};
pub use payloads::{
    CategoryFilter, CategoryPatch, CategoryPayload, FieldErrors, TaskCriteria, TaskFilter,
    TaskOrdering, TaskPatch, TaskPayload,
};
pub use responses::{CategoryCount, CategoryResponse, Page, PriorityCounts, TaskResponse, TaskStats};
