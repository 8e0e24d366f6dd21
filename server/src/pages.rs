// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Server-rendered pages: the dashboard, the task views and the admin console.
//!
//! Forms follow post/redirect/get: a valid submission answers `303 See Other`,
//! an invalid one renders the form again with its errors.

use crate::error::PageError;
use crate::pagination::{InvalidPage, PageRequest};
use crate::{database, validation, AppState};
use axum::{
    extract::{Form, FromRequestParts, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{NaiveDate, Utc};
use common::{
    CategoryPayload, CategoryResponse, FieldErrors, Priority, Task, TaskFilter, TaskPayload,
    TaskResponse, TaskStatus,
};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::{debug, error, info};

const RECENT_TASKS_ON_DASHBOARD: i64 = 5;

/// `Path` whose rejection is the 404 page.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(PageError))]
pub struct PagePath<T>(pub T);

impl From<InvalidPage> for PageError {
    fn from(_: InvalidPage) -> Self {
        PageError::new(StatusCode::NOT_FOUND, "Invalid page.")
    }
}

fn render(state: &AppState, template: &str, context: &Context) -> Result<Html<String>, PageError> {
    Ok(Html(state.templates.render(template, context)?))
}

/// Response middleware: fills the body of `PageError` responses with the
/// rendered `error.html`.
pub async fn render_error_pages(State(state): State<AppState>, response: Response) -> Response {
    let Some(page_error) = response.extensions().get::<PageError>().cloned() else {
        return response;
    };

    let mut context = Context::new();
    context.insert("active", "");
    context.insert("status_code", &page_error.code.as_u16());
    context.insert("reason", &page_error.code.canonical_reason().unwrap_or("Error"));
    context.insert("message", &page_error.message);

    match state.templates.render("error.html", &context) {
        Ok(body) => (page_error.code, Html(body)).into_response(),
        Err(e) => {
            error!("Failed to render error page: {:?}", e);
            (page_error.code, page_error.message).into_response()
        }
    }
}

/// An `<option>` of a `<select>`. Values are strings so templates can compare
/// them with submitted form values.
#[derive(Serialize, Debug)]
struct Choice {
    value: String,
    label: String,
}

fn status_choices() -> Vec<Choice> {
    TaskStatus::ALL
        .iter()
        .map(|s| Choice {
            value: s.as_str().to_string(),
            label: s.label().to_string(),
        })
        .collect()
}

fn priority_choices() -> Vec<Choice> {
    Priority::ALL
        .iter()
        .map(|p| Choice {
            value: i32::from(*p).to_string(),
            label: p.label().to_string(),
        })
        .collect()
}

fn category_choices(categories: &[CategoryResponse]) -> Vec<Choice> {
    categories
        .iter()
        .map(|c| Choice {
            value: c.category.id.to_string(),
            label: c.category.name.clone(),
        })
        .collect()
}

fn ordering_choices() -> Vec<Choice> {
    [
        ("", "Priority"),
        ("due_date", "Due date"),
        ("-created_at", "Newest"),
        ("created_at", "Oldest"),
        ("title", "Title"),
    ]
    .into_iter()
    .map(|(value, label)| Choice {
        value: value.to_string(),
        label: label.to_string(),
    })
    .collect()
}

/// Only same-site paths are accepted as redirect targets.
fn safe_redirect_target(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => path,
        _ => "/tasks/",
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// --- Dashboard ---

pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let today = today();
    let stats = database::task_stats(&state.pool, today).await?;
    let recent = database::recent_tasks(&state.pool, today, RECENT_TASKS_ON_DASHBOARD).await?;
    let overdue = database::overdue_tasks(&state.pool, today).await?;
    let categories = database::list_categories(&state.pool).await?;

    let mut context = Context::new();
    context.insert("active", "dashboard");
    context.insert("stats", &stats);
    context.insert("recent_tasks", &TaskResponse::from_models(recent, today));
    context.insert("overdue_tasks", &TaskResponse::from_models(overdue, today));
    context.insert("categories", &categories);
    render(&state, "dashboard.html", &context)
}

// --- Tasks ---

pub async fn task_list(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Html<String>, PageError> {
    let criteria = filter.criteria().map_err(|errors| {
        debug!("Rejected task filters: {:?}", errors);
        PageError::new(StatusCode::BAD_REQUEST, "Invalid filter values.")
    })?;
    let today = today();

    let count = database::count_tasks(&state.pool, &criteria, today).await?;
    let request = PageRequest::from_filter(&filter, state.page_size)?.resolve(count)?;
    let tasks = database::list_tasks(&state.pool, &criteria, today, request.page_size, request.offset()).await?;
    let categories = database::list_categories(&state.pool).await?;

    let mut context = Context::new();
    context.insert("active", "tasks");
    context.insert("page_number", &request.page);
    context.insert("num_pages", &request.num_pages(count));
    context.insert(
        "page",
        &request.into_page(TaskResponse::from_models(tasks, today), count, "/tasks/", &filter),
    );
    context.insert("filter", &filter);
    context.insert("statuses", &status_choices());
    context.insert("priorities", &priority_choices());
    context.insert("category_choices", &category_choices(&categories));
    context.insert("orderings", &ordering_choices());
    render(&state, "tasks/list.html", &context)
}

async fn load_task(state: &AppState, task_id: i64) -> Result<Task, PageError> {
    database::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(PageError::not_found)
}

pub async fn task_detail(
    State(state): State<AppState>,
    PagePath(task_id): PagePath<i64>,
) -> Result<Html<String>, PageError> {
    let task = load_task(&state, task_id).await?;

    let mut context = Context::new();
    context.insert("active", "tasks");
    context.insert("task", &TaskResponse::from_model(task, today()));
    render(&state, "tasks/detail.html", &context)
}

/// Raw values of the task form. Everything is text until `parse` runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub due_date: String,
}

impl TaskForm {
    fn blank() -> Self {
        Self {
            status: TaskStatus::default().as_str().to_string(),
            priority: i32::from(Priority::default()).to_string(),
            ..Default::default()
        }
    }

    fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.as_str().to_string(),
            priority: i32::from(task.priority).to_string(),
            category: task.category_id.map(|id| id.to_string()).unwrap_or_default(),
            due_date: task.due_date.map(|d| d.to_string()).unwrap_or_default(),
        }
    }

    /// Converts the text fields and runs the payload checks, reporting every
    /// problem at once.
    fn parse(&self) -> Result<TaskPayload, FieldErrors> {
        let mut errors = FieldErrors::new();

        let status = match self.status.trim() {
            "" => TaskStatus::default(),
            raw => raw.parse().unwrap_or_else(|e: String| {
                errors.add("status", e);
                TaskStatus::default()
            }),
        };
        let priority = match self.priority.trim() {
            "" => Priority::default(),
            raw => raw.parse().unwrap_or_else(|e: String| {
                errors.add("priority", e);
                Priority::default()
            }),
        };
        let category = match self.category.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("category", "Select a valid choice.");
                    None
                }
            },
        };
        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.add("due_date", "Enter a valid date.");
                    None
                }
            },
        };

        let payload = TaskPayload {
            title: self.title.clone(),
            description: Some(self.description.clone()),
            status,
            priority,
            category,
            due_date,
        };
        match payload.check() {
            Ok(payload) if errors.is_empty() => Ok(payload),
            Ok(_) => Err(errors),
            Err(check_errors) => {
                errors.merge(check_errors);
                Err(errors)
            }
        }
    }
}

async fn render_task_form(
    state: &AppState,
    form: &TaskForm,
    errors: &FieldErrors,
    task: Option<&Task>,
) -> Result<Html<String>, PageError> {
    let categories = database::list_categories(&state.pool).await?;

    let mut context = Context::new();
    context.insert("active", "tasks");
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("statuses", &status_choices());
    context.insert("priorities", &priority_choices());
    context.insert("category_choices", &category_choices(&categories));
    context.insert("task", &task);
    render(state, "tasks/form.html", &context)
}

/// Parses and validates a submitted task form.
/// `Err` carries the re-rendered form.
async fn clean_task_form(state: &AppState, form: &TaskForm, task: Option<&Task>) -> Result<TaskPayload, Response> {
    let verdict = match form.parse() {
        Ok(payload) => validation::clean_task(&state.pool, payload)
            .await
            .map_err(|e| PageError::from(e).into_response())?,
        Err(errors) => Err(errors),
    };
    match verdict {
        Ok(payload) => Ok(payload),
        Err(errors) => {
            debug!("Task form rejected: {:?}", errors);
            Err(render_task_form(state, form, &errors, task).await.into_response())
        }
    }
}

pub async fn task_create_form(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render_task_form(&state, &TaskForm::blank(), &FieldErrors::new(), None).await
}

pub async fn task_create(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Result<Response, PageError> {
    let payload = match clean_task_form(&state, &form, None).await {
        Ok(payload) => payload,
        Err(response) => return Ok(response),
    };
    let task = database::create_task(&state.pool, &payload).await?;
    info!("Task created from form with ID: {}", task.id);
    Ok(Redirect::to(&format!("/tasks/{}/", task.id)).into_response())
}

pub async fn task_edit_form(
    State(state): State<AppState>,
    PagePath(task_id): PagePath<i64>,
) -> Result<Html<String>, PageError> {
    let task = load_task(&state, task_id).await?;
    render_task_form(&state, &TaskForm::from_task(&task), &FieldErrors::new(), Some(&task)).await
}

pub async fn task_edit(
    State(state): State<AppState>,
    PagePath(task_id): PagePath<i64>,
    Form(form): Form<TaskForm>,
) -> Result<Response, PageError> {
    let task = load_task(&state, task_id).await?;
    let payload = match clean_task_form(&state, &form, Some(&task)).await {
        Ok(payload) => payload,
        Err(response) => return Ok(response),
    };
    database::update_task(&state.pool, task_id, &payload)
        .await?
        .ok_or_else(PageError::not_found)?;
    info!("Task {} updated from form.", task_id);
    Ok(Redirect::to(&format!("/tasks/{task_id}/")).into_response())
}

pub async fn task_delete_confirm(
    State(state): State<AppState>,
    PagePath(task_id): PagePath<i64>,
) -> Result<Html<String>, PageError> {
    let task = load_task(&state, task_id).await?;

    let mut context = Context::new();
    context.insert("active", "tasks");
    context.insert("task", &TaskResponse::from_model(task, today()));
    render(&state, "tasks/confirm_delete.html", &context)
}

pub async fn task_delete(State(state): State<AppState>, PagePath(task_id): PagePath<i64>) -> Result<Redirect, PageError> {
    if !database::delete_task(&state.pool, task_id).await? {
        return Err(PageError::not_found());
    }
    info!("Task {} deleted from form.", task_id);
    Ok(Redirect::to("/tasks/"))
}

#[derive(Deserialize, Debug, Default)]
pub struct ToggleForm {
    pub next: Option<String>,
}

pub async fn task_toggle(
    State(state): State<AppState>,
    PagePath(task_id): PagePath<i64>,
    Form(form): Form<ToggleForm>,
) -> Result<Redirect, PageError> {
    let task = database::toggle_task_status(&state.pool, task_id)
        .await?
        .ok_or_else(PageError::not_found)?;
    debug!("Task {} is now {}", task_id, task.status);
    Ok(Redirect::to(safe_redirect_target(form.next.as_deref())))
}

// --- Admin console ---

pub async fn admin_index(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let categories = database::list_categories(&state.pool).await?;
    let stats = database::task_stats(&state.pool, today()).await?;

    let mut context = Context::new();
    context.insert("active", "admin");
    context.insert("categories", &categories);
    context.insert("stats", &stats);
    render(&state, "admin/index.html", &context)
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl CategoryForm {
    fn into_payload(self) -> CategoryPayload {
        CategoryPayload {
            name: self.name,
            color: Some(self.color),
        }
    }
}

fn render_category_form(
    state: &AppState,
    form: &CategoryForm,
    errors: &FieldErrors,
    category: Option<&CategoryResponse>,
) -> Result<Html<String>, PageError> {
    let mut context = Context::new();
    context.insert("active", "admin");
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("category", &category);
    render(state, "admin/category_form.html", &context)
}

async fn load_category(state: &AppState, category_id: i64) -> Result<CategoryResponse, PageError> {
    database::get_category(&state.pool, category_id)
        .await?
        .ok_or_else(PageError::not_found)
}

pub async fn admin_category_create_form(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    render_category_form(&state, &CategoryForm::default(), &FieldErrors::new(), None)
}

pub async fn admin_category_create(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    let verdict = match validation::clean_category(&state.pool, form.clone().into_payload(), None).await? {
        Ok(payload) => validation::create_category(&state.pool, &payload).await?,
        Err(errors) => Err(errors),
    };
    match verdict {
        Ok(category) => {
            info!("Category {} created from admin.", category.id);
            Ok(Redirect::to("/admin/").into_response())
        }
        Err(errors) => Ok(render_category_form(&state, &form, &errors, None)?.into_response()),
    }
}

pub async fn admin_category_edit_form(
    State(state): State<AppState>,
    PagePath(category_id): PagePath<i64>,
) -> Result<Html<String>, PageError> {
    let category = load_category(&state, category_id).await?;
    let form = CategoryForm {
        name: category.category.name.clone(),
        color: category.category.color.clone(),
    };
    render_category_form(&state, &form, &FieldErrors::new(), Some(&category))
}

pub async fn admin_category_edit(
    State(state): State<AppState>,
    PagePath(category_id): PagePath<i64>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    let category = load_category(&state, category_id).await?;
    let verdict = match validation::clean_category(&state.pool, form.clone().into_payload(), Some(category_id)).await? {
        Ok(payload) => validation::update_category(&state.pool, category_id, &payload).await?,
        Err(errors) => Err(errors),
    };
    match verdict {
        Ok(updated) => {
            updated.ok_or_else(PageError::not_found)?;
            info!("Category {} updated from admin.", category_id);
            Ok(Redirect::to("/admin/").into_response())
        }
        Err(errors) => Ok(render_category_form(&state, &form, &errors, Some(&category))?.into_response()),
    }
}

pub async fn admin_category_delete(
    State(state): State<AppState>,
    PagePath(category_id): PagePath<i64>,
) -> Result<Redirect, PageError> {
    if !database::delete_category(&state.pool, category_id).await? {
        return Err(PageError::not_found());
    }
    info!("Category {} deleted from admin.", category_id);
    Ok(Redirect::to("/admin/"))
}
