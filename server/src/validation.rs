// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Payload checks that need the database, on top of the field rules in
//! `common::payloads`. Shared by the JSON API and the HTML forms.
//!
//! The outer `Result` is a database failure, the inner one the verdict.

use anyhow::Result;
use common::{Category, CategoryPayload, CategoryResponse, FieldErrors, TaskPayload};
use sqlx::SqlitePool;

use crate::database;

pub async fn clean_task(pool: &SqlitePool, payload: TaskPayload) -> Result<Result<TaskPayload, FieldErrors>> {
    let payload = match payload.check() {
        Ok(p) => p,
        Err(errors) => return Ok(Err(errors)),
    };
    if let Some(category_id) = payload.category {
        if !database::category_exists(pool, category_id).await? {
            let mut errors = FieldErrors::new();
            errors.add("category", format!("Invalid pk \"{category_id}\" - object does not exist."));
            return Ok(Err(errors));
        }
    }
    Ok(Ok(payload))
}

/// `editing` is the id of the category being updated, if any.
pub async fn clean_category(
    pool: &SqlitePool,
    payload: CategoryPayload,
    editing: Option<i64>,
) -> Result<Result<CategoryPayload, FieldErrors>> {
    let payload = match payload.check() {
        Ok(p) => p,
        Err(errors) => return Ok(Err(errors)),
    };
    if database::category_name_taken(pool, &payload.name, editing).await? {
        return Ok(Err(duplicate_name()));
    }
    Ok(Ok(payload))
}

fn duplicate_name() -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("name", "A category with this name already exists.");
    errors
}

/// The `UNIQUE` constraint on `categories.name` fired.
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

/// Inserts a checked category. A concurrent insert of the same name that
/// slipped past `clean_category` is reported like a duplicate.
pub async fn create_category(pool: &SqlitePool, payload: &CategoryPayload) -> Result<Result<Category, FieldErrors>> {
    match database::create_category(pool, payload).await {
        Ok(category) => Ok(Ok(category)),
        Err(e) if is_unique_violation(&e) => Ok(Err(duplicate_name())),
        Err(e) => Err(e),
    }
}

pub async fn update_category(
    pool: &SqlitePool,
    category_id: i64,
    payload: &CategoryPayload,
) -> Result<Result<Option<CategoryResponse>, FieldErrors>> {
    match database::update_category(pool, category_id, payload).await {
        Ok(category) => Ok(Ok(category)),
        Err(e) if is_unique_violation(&e) => Ok(Err(duplicate_name())),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Priority, TaskStatus};

    fn task(title: &str, category: Option<i64>) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Low,
            category,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_category_is_a_field_error() {
        let pool = database::establish_connection_pool("sqlite::memory:").await.unwrap();
        let errors = clean_task(&pool, task("Call plumber", Some(3))).await.unwrap().unwrap_err();
        assert_eq!(
            errors.get("category"),
            Some(&["Invalid pk \"3\" - object does not exist.".to_string()][..])
        );
        assert!(clean_task(&pool, task("Call plumber", None)).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_category_name() {
        let pool = database::establish_connection_pool("sqlite::memory:").await.unwrap();
        let payload = CategoryPayload {
            name: "Home".to_string(),
            color: None,
        };
        let home = database::create_category(&pool, &payload).await.unwrap();

        let errors = clean_category(&pool, payload.clone(), None).await.unwrap().unwrap_err();
        assert!(errors.get("name").is_some());
        // Saving the category under its own name is fine.
        assert!(clean_category(&pool, payload, Some(home.id)).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_name_clash_at_insert_is_a_field_error() {
        let pool = database::establish_connection_pool("sqlite::memory:").await.unwrap();
        let payload = CategoryPayload {
            name: "Garden".to_string(),
            color: None,
        };
        // Both requests passed `clean_category` before either was saved.
        validation_ok(create_category(&pool, &payload).await);
        let errors = create_category(&pool, &payload).await.unwrap().unwrap_err();
        assert_eq!(
            errors.get("name"),
            Some(&["A category with this name already exists.".to_string()][..])
        );

        let shed = CategoryPayload {
            name: "Shed".to_string(),
            color: None,
        };
        let shed = validation_ok(create_category(&pool, &shed).await);
        let errors = update_category(&pool, shed.id, &payload).await.unwrap().unwrap_err();
        assert!(errors.get("name").is_some());
    }

    fn validation_ok<T>(verdict: Result<Result<T, FieldErrors>>) -> T {
        verdict.unwrap().unwrap()
    }
}
