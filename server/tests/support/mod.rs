// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
#![allow(dead_code)]

use std::path::Path;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt; // For `collect`
use server::database;
use server::routes::create_router;
use server::templates::Templates;
use server::AppState;
use sqlx::SqlitePool;
use tower::ServiceExt; // For `oneshot`

pub const PAGE_SIZE: u32 = 10;

/// A router over a fresh in-memory database, with the real templates.
pub async fn setup_app() -> (Router, SqlitePool) {
    let pool = database::establish_connection_pool("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite");
    let templates = Templates::load(
        Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates")),
        false,
    )
    .expect("Failed to load templates");

    let state = AppState {
        pool: pool.clone(),
        templates,
        page_size: PAGE_SIZE,
    };
    let app = create_router(state, Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")));
    (app, pool)
}

pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub struct HtmlResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

async fn into_html(response: axum::response::Response) -> HtmlResponse {
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    HtmlResponse {
        status,
        location,
        content_type,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get_page(app: &Router, uri: &str) -> HtmlResponse {
    let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
    into_html(app.clone().oneshot(request).await.unwrap()).await
}

/// POSTs an urlencoded form, as a browser would.
pub async fn post_form(app: &Router, uri: &str, form: &[(&str, &str)]) -> HtmlResponse {
    let body = serde_urlencoded::to_string(form).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap();
    into_html(app.clone().oneshot(request).await.unwrap()).await
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
