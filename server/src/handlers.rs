// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! JSON API handlers, mounted under `/api/`.

use crate::error::AppError;
use crate::pagination::{InvalidPage, PageRequest};
use crate::{database, validation, AppState};
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use common::{
    CategoryPatch, CategoryPayload, CategoryResponse, Page, TaskFilter, TaskPatch, TaskPayload,
    TaskResponse, TaskStats,
};
use tracing::{debug, info};

/// `Json` whose rejections are reported as `AppError`s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` answering 404 when a segment doesn't parse, e.g. `/api/tasks/abc/`.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<InvalidPage> for AppError {
    fn from(_: InvalidPage) -> Self {
        AppError::new(StatusCode::NOT_FOUND, "Invalid page.")
    }
}

// --- Tasks ---

/// Handler for listing tasks, filtered and paginated.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Page<TaskResponse>>, AppError> {
    let criteria = filter.criteria()?;
    let today = Utc::now().date_naive();

    let count = database::count_tasks(&state.pool, &criteria, today).await?;
    let request = PageRequest::from_filter(&filter, state.page_size)?.resolve(count)?;
    let tasks = database::list_tasks(&state.pool, &criteria, today, request.page_size, request.offset()).await?;

    info!("Successfully retrieved {} of {} tasks.", tasks.len(), count);
    let results = TaskResponse::from_models(tasks, today);
    Ok(Json(request.into_page(results, count, "/api/tasks/", &filter)))
}

/// Handler for creating a new task.
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TaskPayload>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    debug!("Received request to create task: {}", payload.title);
    let payload = validation::clean_task(&state.pool, payload).await??;

    let task = database::create_task(&state.pool, &payload).await?;
    info!("Task created successfully with ID: {}", task.id);

    // Return a 201 Created status with the new task as JSON.
    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::from_model(task, Utc::now().date_naive())),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = database::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", task_id))?;
    Ok(Json(TaskResponse::from_model(task, Utc::now().date_naive())))
}

async fn save_task(state: &AppState, task_id: i64, payload: TaskPayload) -> Result<Json<TaskResponse>, AppError> {
    let payload = validation::clean_task(&state.pool, payload).await??;
    let task = database::update_task(&state.pool, task_id, &payload)
        .await?
        .ok_or_else(|| AppError::not_found("Task", task_id))?;
    Ok(Json(TaskResponse::from_model(task, Utc::now().date_naive())))
}

/// `PUT`: every field is replaced, omitted ones take their defaults.
pub async fn update_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<TaskPayload>,
) -> Result<Json<TaskResponse>, AppError> {
    debug!("Received full update for task {}", task_id);
    if database::get_task(&state.pool, task_id).await?.is_none() {
        return Err(AppError::not_found("Task", task_id));
    }
    save_task(&state, task_id, payload).await
}

/// `PATCH`: only the fields present in the body change.
pub async fn patch_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<TaskResponse>, AppError> {
    debug!("Received partial update for task {}", task_id);
    let current = database::get_task(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", task_id))?;
    save_task(&state, task_id, patch.apply_to(&current)?).await
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>, // Extract task ID from the URL path
) -> Result<StatusCode, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    if database::delete_task(&state.pool, task_id).await? {
        info!("Task with ID {} deleted successfully.", task_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Task", task_id))
    }
}

/// Handler for marking a task done, or not done again.
pub async fn toggle_task_status(
    State(state): State<AppState>,
    ApiPath(task_id): ApiPath<i64>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = database::toggle_task_status(&state.pool, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task", task_id))?;
    Ok(Json(TaskResponse::from_model(task, Utc::now().date_naive())))
}

pub async fn task_stats(State(state): State<AppState>) -> Result<Json<TaskStats>, AppError> {
    let stats = database::task_stats(&state.pool, Utc::now().date_naive()).await?;
    debug!("Computed stats over {} tasks.", stats.total);
    Ok(Json(stats))
}

// --- Categories ---

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = database::list_categories(&state.pool).await?;
    info!("Successfully retrieved {} categories.", categories.len());
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let payload = validation::clean_category(&state.pool, payload, None).await??;
    let category = validation::create_category(&state.pool, &payload).await??;
    info!("Category created successfully with ID: {}", category.id);

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            category,
            task_count: 0,
        }),
    ))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<Json<CategoryResponse>, AppError> {
    let category = database::get_category(&state.pool, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category", category_id))?;
    Ok(Json(category))
}

async fn save_category(
    state: &AppState,
    category_id: i64,
    payload: CategoryPayload,
) -> Result<Json<CategoryResponse>, AppError> {
    let payload = validation::clean_category(&state.pool, payload, Some(category_id)).await??;
    let category = validation::update_category(&state.pool, category_id, &payload)
        .await??
        .ok_or_else(|| AppError::not_found("Category", category_id))?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CategoryPayload>,
) -> Result<Json<CategoryResponse>, AppError> {
    if database::get_category(&state.pool, category_id).await?.is_none() {
        return Err(AppError::not_found("Category", category_id));
    }
    save_category(&state, category_id, payload).await
}

pub async fn patch_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Json<CategoryResponse>, AppError> {
    let current = database::get_category(&state.pool, category_id)
        .await?
        .ok_or_else(|| AppError::not_found("Category", category_id))?;
    save_category(&state, category_id, patch.apply_to(&current.category)?).await
}

/// Deletes a category; its tasks stay, without a category.
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(category_id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    if database::delete_category(&state.pool, category_id).await? {
        info!("Category with ID {} deleted successfully.", category_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Category", category_id))
    }
}
