// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Taskboard server: a task manager with server-rendered pages, an admin
//! console and a JSON API over the same SQLite database.

pub mod colors;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod pagination;
pub mod routes;
pub mod templates;
pub mod validation;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::templates::Templates;

/// Shared by every handler through axum's `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub templates: Templates,
    /// Default number of tasks per page.
    pub page_size: u32,
}

impl AppState {
    /// Connects to the database and loads the templates named by `settings`.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        let pool = database::establish_connection_pool(&settings.database_url).await?;
        let templates = Templates::load(&settings.template_dir, settings.template_reload)?;
        Ok(Self {
            pool,
            templates,
            page_size: settings.page_size,
        })
    }
}
