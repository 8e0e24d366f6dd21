// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;

use crate::error::{AppError, PageError};
use crate::{handlers, pages, AppState};
use axum::{
    http::{HeaderName, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// JSON API, mirroring the HTML views.
fn api_router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ])
        .allow_origin(Any);

    Router::new()
        .route("/api/tasks/", get(handlers::list_tasks).post(handlers::create_task))
        // Static segment, matched before `{id}`.
        .route("/api/tasks/stats/", get(handlers::task_stats))
        .route(
            "/api/tasks/{id}/",
            get(handlers::get_task)
                .put(handlers::update_task)
                .patch(handlers::patch_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/toggle_status/", post(handlers::toggle_task_status))
        .route(
            "/api/categories/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/{id}/",
            get(handlers::get_category)
                .put(handlers::update_category)
                .patch(handlers::patch_category)
                .delete(handlers::delete_category),
        )
        .layer(cors)
}

/// Server-rendered pages and the admin console.
fn pages_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/tasks/", get(pages::task_list))
        .route("/tasks/new/", get(pages::task_create_form).post(pages::task_create))
        .route("/tasks/{id}/", get(pages::task_detail))
        .route("/tasks/{id}/edit/", get(pages::task_edit_form).post(pages::task_edit))
        .route(
            "/tasks/{id}/delete/",
            get(pages::task_delete_confirm).post(pages::task_delete),
        )
        .route("/tasks/{id}/toggle/", post(pages::task_toggle))
        .route("/admin/", get(pages::admin_index))
        .route(
            "/admin/categories/new/",
            get(pages::admin_category_create_form).post(pages::admin_category_create),
        )
        .route(
            "/admin/categories/{id}/edit/",
            get(pages::admin_category_edit_form).post(pages::admin_category_edit),
        )
        .route("/admin/categories/{id}/delete/", post(pages::admin_category_delete))
        .fallback(fallback)
        .layer(middleware::map_response_with_state(state, pages::render_error_pages))
}

/// Unknown paths: JSON under `/api/`, an error page elsewhere.
async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        AppError::new(StatusCode::NOT_FOUND, "Not found.").into_response()
    } else {
        PageError::not_found().into_response()
    }
}

/// Creates and configures the application router.
pub fn create_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .merge(api_router())
        .merge(pages_router(state.clone()))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        // Adds the database pool and templates to the application state
        .with_state(state)
}
