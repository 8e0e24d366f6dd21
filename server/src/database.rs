// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::colors;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use common::{
    Category, CategoryCount, CategoryFilter, CategoryPayload, CategoryResponse, PriorityCounts,
    Task, TaskCriteria, TaskOrdering, TaskPayload, TaskStats,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

// Applied in order on every start; each statement is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        color TEXT NOT NULL,
        created_at TIMESTAMP NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NULL,
        status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in_progress', 'done')),
        priority INTEGER NOT NULL DEFAULT 2 CHECK (priority IN (1, 2, 3)),
        category_id INTEGER NULL REFERENCES categories(id) ON DELETE SET NULL,
        due_date DATE NULL,
        created_at TIMESTAMP NOT NULL,
        updated_at TIMESTAMP NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);",
    "CREATE INDEX IF NOT EXISTS idx_tasks_category_id ON tasks(category_id);",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);",
];

const TASK_SELECT: &str = r#"
    SELECT t.id, t.title, t.description, t.status, t.priority, t.category_id,
           c.name AS category_name, c.color AS category_color,
           t.due_date, t.created_at, t.updated_at
    FROM tasks t
    LEFT JOIN categories c ON c.id = t.category_id
"#;

const CATEGORY_SELECT: &str = r#"
    SELECT c.id, c.name, c.color, c.created_at, COUNT(t.id) AS task_count
    FROM categories c
    LEFT JOIN tasks t ON t.category_id = c.id
"#;

/// Establishes the database connection pool.
/// If the database file (or its directory) does not exist, it is created.
/// Foreign keys are enforced so that deleting a category clears its tasks'
/// `category_id`.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:");
    if !in_memory {
        if let Some(parent) = Path::new(options.get_filename()).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating database directory {}", parent.display());
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
    }

    // An in-memory database lives as long as its connections: a single one,
    // never recycled, keeps every query on the same data.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .context("Failed to apply database schema")?;
    }

    info!("Database schema is ready.");

    Ok(pool)
}

// --- Categories ---

/// All categories ordered by name, each with its number of tasks.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategoryResponse>> {
    let sql = format!("{CATEGORY_SELECT} GROUP BY c.id ORDER BY c.name COLLATE NOCASE ASC");
    let categories = sqlx::query_as::<_, CategoryResponse>(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to retrieve categories from DB")?;

    Ok(categories)
}

pub async fn get_category(pool: &SqlitePool, category_id: i64) -> Result<Option<CategoryResponse>> {
    let sql = format!("{CATEGORY_SELECT} WHERE c.id = ? GROUP BY c.id");
    let category = sqlx::query_as::<_, CategoryResponse>(&sql)
        .bind(category_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve category with ID: {category_id}"))?;

    Ok(category)
}

pub async fn category_exists(pool: &SqlitePool, category_id: i64) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_one(pool)
        .await
        .context("Failed to look up category")?;

    Ok(count > 0)
}

/// Whether another category already uses `name`. `exclude_id` skips the
/// category being edited.
pub async fn category_name_taken(
    pool: &SqlitePool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = ? AND (? IS NULL OR id != ?)")
            .bind(name)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check category name")?;

    Ok(count > 0)
}

/// Inserts a new category. Without a color, the next palette color is used.
pub async fn create_category(pool: &SqlitePool, payload: &CategoryPayload) -> Result<Category> {
    let color = match &payload.color {
        Some(color) => color.clone(),
        None => {
            let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
                .fetch_one(pool)
                .await
                .context("Failed to count categories")?;
            colors::default_color_for(existing).to_string()
        }
    };
    let created_at = Utc::now();

    debug!("Insert category: name={}, color={}", payload.name, color);

    let id = sqlx::query("INSERT INTO categories (name, color, created_at) VALUES (?, ?, ?)")
        .bind(&payload.name)
        .bind(&color)
        .bind(created_at)
        .execute(pool)
        .await
        .context("Failed to insert category into DB")?
        .last_insert_rowid();

    info!("Created category {} ({})", id, payload.name);

    Ok(Category {
        id,
        name: payload.name.clone(),
        color,
        created_at,
    })
}

/// Renames/recolors a category. A missing color keeps the current one.
/// Returns `None` when no category has this id.
pub async fn update_category(
    pool: &SqlitePool,
    category_id: i64,
    payload: &CategoryPayload,
) -> Result<Option<CategoryResponse>> {
    let result = sqlx::query("UPDATE categories SET name = ?, color = COALESCE(?, color) WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.color)
        .bind(category_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update category with ID: {category_id}"))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    info!("Updated category {}", category_id);
    get_category(pool, category_id).await
}

/// Deletes a category. Its tasks are kept, uncategorized.
/// Returns false if no category with the given ID was found.
pub async fn delete_category(pool: &SqlitePool, category_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(category_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete category with ID: {category_id}"))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows for category ID: {}", rows_affected, category_id);

    Ok(rows_affected > 0)
}

// --- Tasks ---

fn push_task_filters(qb: &mut QueryBuilder<'_, Sqlite>, criteria: &TaskCriteria, today: NaiveDate) {
    qb.push(" WHERE 1 = 1");

    if let Some(status) = criteria.status {
        qb.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = criteria.priority {
        qb.push(" AND t.priority = ").push_bind(priority);
    }
    match criteria.category {
        Some(CategoryFilter::Id(id)) => {
            qb.push(" AND t.category_id = ").push_bind(id);
        }
        Some(CategoryFilter::Uncategorized) => {
            qb.push(" AND t.category_id IS NULL");
        }
        None => {}
    }
    if let Some(search) = &criteria.search {
        let escaped = search
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        qb.push(" AND (t.title LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR t.description LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
    match criteria.overdue {
        Some(true) => {
            qb.push(" AND t.due_date IS NOT NULL AND t.status != 'done' AND t.due_date < ")
                .push_bind(today);
        }
        Some(false) => {
            qb.push(" AND NOT (t.due_date IS NOT NULL AND t.status != 'done' AND t.due_date < ")
                .push_bind(today)
                .push(")");
        }
        None => {}
    }
}

fn order_clause(ordering: TaskOrdering) -> &'static str {
    match ordering {
        TaskOrdering::Default => {
            " ORDER BY t.priority DESC, t.due_date ASC NULLS LAST, t.created_at DESC, t.id DESC"
        }
        TaskOrdering::CreatedAsc => " ORDER BY t.created_at ASC, t.id ASC",
        TaskOrdering::CreatedDesc => " ORDER BY t.created_at DESC, t.id DESC",
        TaskOrdering::DueDateAsc => " ORDER BY t.due_date ASC NULLS LAST, t.id ASC",
        TaskOrdering::DueDateDesc => " ORDER BY t.due_date DESC NULLS LAST, t.id DESC",
        TaskOrdering::PriorityAsc => " ORDER BY t.priority ASC, t.id ASC",
        TaskOrdering::PriorityDesc => " ORDER BY t.priority DESC, t.id DESC",
        TaskOrdering::TitleAsc => " ORDER BY t.title COLLATE NOCASE ASC, t.id ASC",
        TaskOrdering::TitleDesc => " ORDER BY t.title COLLATE NOCASE DESC, t.id DESC",
    }
}

/// Retrieves the tasks matching `criteria`, one page at a time.
pub async fn list_tasks(
    pool: &SqlitePool,
    criteria: &TaskCriteria,
    today: NaiveDate,
    limit: i64,
    offset: i64,
) -> Result<Vec<Task>> {
    let mut qb = QueryBuilder::<Sqlite>::new(TASK_SELECT);
    push_task_filters(&mut qb, criteria, today);
    qb.push(order_clause(criteria.ordering));
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    let tasks = qb
        .build_query_as::<Task>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve tasks from DB")?;

    Ok(tasks)
}

pub async fn count_tasks(pool: &SqlitePool, criteria: &TaskCriteria, today: NaiveDate) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks t");
    push_task_filters(&mut qb, criteria, today);

    let count = qb
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count tasks in DB")?;

    Ok(count)
}

pub async fn get_task(pool: &SqlitePool, task_id: i64) -> Result<Option<Task>> {
    let sql = format!("{TASK_SELECT} WHERE t.id = ?");
    let task = sqlx::query_as::<_, Task>(&sql)
        .bind(task_id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve task with ID: {task_id}"))?;

    Ok(task)
}

/// Inserts a new task into the database.
pub async fn create_task(pool: &SqlitePool, payload: &TaskPayload) -> Result<Task> {
    let now = Utc::now();

    debug!(
        "Insert values: title={}, status={}, priority={:?}, category={:?}, due_date={:?}",
        payload.title, payload.status, payload.priority, payload.category, payload.due_date
    );

    let id = sqlx::query(
        "INSERT INTO tasks (title, description, status, priority, category_id, due_date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.status)
    .bind(payload.priority)
    .bind(payload.category)
    .bind(payload.due_date)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert task into DB")?
    .last_insert_rowid();

    info!("Created task {}", id);

    get_task(pool, id)
        .await?
        .with_context(|| format!("Task {id} missing right after insert"))
}

/// Overwrites every editable field of a task and bumps `updated_at`.
/// Returns `None` when no task has this id.
pub async fn update_task(pool: &SqlitePool, task_id: i64, payload: &TaskPayload) -> Result<Option<Task>> {
    let result = sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, category_id = ?, \
         due_date = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.status)
    .bind(payload.priority)
    .bind(payload.category)
    .bind(payload.due_date)
    .bind(Utc::now())
    .bind(task_id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update task with ID: {task_id}"))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    info!("Updated task {}", task_id);
    get_task(pool, task_id).await
}

/// Deletes a task. Returns false if no task with the given ID was found.
pub async fn delete_task(pool: &SqlitePool, task_id: i64) -> Result<bool> {
    debug!("Attempting to delete task with ID: {}", task_id);
    let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete task with ID: {task_id}"))?;

    let rows_affected = result.rows_affected();
    info!("Deleted {} rows for task ID: {}", rows_affected, task_id);

    Ok(rows_affected > 0)
}

/// Flips a task between done and not done (see `TaskStatus::toggled`).
pub async fn toggle_task_status(pool: &SqlitePool, task_id: i64) -> Result<Option<Task>> {
    let Some(task) = get_task(pool, task_id).await? else {
        return Ok(None);
    };
    let next = task.status.toggled();

    sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ?")
        .bind(next)
        .bind(Utc::now())
        .bind(task_id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to toggle status of task with ID: {task_id}"))?;

    info!("Task {} status {} -> {}", task_id, task.status, next);
    get_task(pool, task_id).await
}

/// The `limit` most recently created tasks.
pub async fn recent_tasks(pool: &SqlitePool, today: NaiveDate, limit: i64) -> Result<Vec<Task>> {
    let criteria = TaskCriteria {
        ordering: TaskOrdering::CreatedDesc,
        ..Default::default()
    };
    list_tasks(pool, &criteria, today, limit, 0).await
}

/// Every overdue task, most overdue first.
pub async fn overdue_tasks(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<Task>> {
    let criteria = TaskCriteria {
        overdue: Some(true),
        ordering: TaskOrdering::DueDateAsc,
        ..Default::default()
    };
    list_tasks(pool, &criteria, today, i64::MAX, 0).await
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    todo: i64,
    in_progress: i64,
    done: i64,
    overdue: i64,
    low: i64,
    medium: i64,
    high: i64,
    uncategorized: i64,
}

/// Counts by status, priority and category, computed in the database.
pub async fn task_stats(pool: &SqlitePool, today: NaiveDate) -> Result<TaskStats> {
    let row = sqlx::query_as::<_, StatsRow>(
        r#"
        SELECT COUNT(*) AS total,
               COALESCE(SUM(status = 'todo'), 0) AS todo,
               COALESCE(SUM(status = 'in_progress'), 0) AS in_progress,
               COALESCE(SUM(status = 'done'), 0) AS done,
               COALESCE(SUM(due_date IS NOT NULL AND status != 'done' AND due_date < ?), 0) AS overdue,
               COALESCE(SUM(priority = 1), 0) AS low,
               COALESCE(SUM(priority = 2), 0) AS medium,
               COALESCE(SUM(priority = 3), 0) AS high,
               COALESCE(SUM(category_id IS NULL), 0) AS uncategorized
        FROM tasks
        "#,
    )
    .bind(today)
    .fetch_one(pool)
    .await
    .context("Failed to compute task statistics")?;

    let by_category = sqlx::query_as::<_, CategoryCount>(
        r#"
        SELECT c.id, c.name, c.color, COUNT(t.id) AS count
        FROM categories c
        LEFT JOIN tasks t ON t.category_id = c.id
        GROUP BY c.id
        ORDER BY count DESC, c.name COLLATE NOCASE ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to count tasks per category")?;

    Ok(TaskStats {
        total: row.total,
        todo: row.todo,
        in_progress: row.in_progress,
        done: row.done,
        overdue: row.overdue,
        completion_rate: TaskStats::completion_rate(row.done, row.total),
        by_priority: PriorityCounts {
            low: row.low,
            medium: row.medium,
            high: row.high,
        },
        by_category,
        uncategorized: row.uncategorized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{Priority, TaskStatus};

    /// A fresh, empty in-memory database for each test.
    async fn setup_test_db() -> SqlitePool {
        establish_connection_pool("sqlite::memory:").await.unwrap()
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn task_payload(title: &str) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            category: None,
            due_date: None,
        }
    }

    fn category_payload(name: &str) -> CategoryPayload {
        CategoryPayload {
            name: name.to_string(),
            color: None,
        }
    }

    async fn all_tasks(pool: &SqlitePool, criteria: &TaskCriteria) -> Vec<Task> {
        list_tasks(pool, criteria, today(), 100, 0).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_task() {
        let pool = setup_test_db().await;
        let work = create_category(&pool, &category_payload("Work")).await.unwrap();

        let mut payload = task_payload("Test the database");
        payload.description = Some("Check every column".to_string());
        payload.priority = Priority::High;
        payload.category = Some(work.id);
        payload.due_date = Some(today());

        let created = create_task(&pool, &payload).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.title, "Test the database");
        assert_eq!(created.status, TaskStatus::Todo);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.category_id, Some(work.id));
        assert_eq!(created.category_name.as_deref(), Some("Work"));
        assert_eq!(created.category_color, Some(work.color.clone()));
        assert_eq!(created.due_date, Some(today()));

        let fetched = get_task(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(get_task(&pool, created.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_task_bumps_updated_at() {
        let pool = setup_test_db().await;
        let created = create_task(&pool, &task_payload("Draft")).await.unwrap();

        let mut payload = task_payload("Final");
        payload.status = TaskStatus::InProgress;
        let updated = update_task(&pool, created.id, &payload).await.unwrap().unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        assert!(update_task(&pool, 999, &payload).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_task() {
        let pool = setup_test_db().await;
        let created = create_task(&pool, &task_payload("Temporary")).await.unwrap();

        assert!(delete_task(&pool, created.id).await.unwrap());
        assert!(get_task(&pool, created.id).await.unwrap().is_none());
        // A second delete finds nothing.
        assert!(!delete_task(&pool, created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_task_status() {
        let pool = setup_test_db().await;
        let mut payload = task_payload("Toggle me");
        payload.status = TaskStatus::InProgress;
        let created = create_task(&pool, &payload).await.unwrap();

        let toggled = toggle_task_status(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(toggled.status, TaskStatus::Done);
        let toggled = toggle_task_status(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(toggled.status, TaskStatus::Todo);

        assert!(toggle_task_status(&pool, 12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleting_category_keeps_tasks() {
        let pool = setup_test_db().await;
        let home = create_category(&pool, &category_payload("Home")).await.unwrap();
        let mut payload = task_payload("Fix the sink");
        payload.category = Some(home.id);
        let task = create_task(&pool, &payload).await.unwrap();

        assert!(delete_category(&pool, home.id).await.unwrap());

        let task = get_task(&pool, task.id).await.unwrap().unwrap();
        assert_eq!(task.category_id, None);
        assert_eq!(task.category_name, None);
        assert!(!delete_category(&pool, home.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_category_defaults_and_counts() {
        let pool = setup_test_db().await;
        let first = create_category(&pool, &category_payload("Work")).await.unwrap();
        let second = create_category(&pool, &category_payload("Errands")).await.unwrap();
        assert_eq!(first.color, colors::default_color_for(0));
        assert_eq!(second.color, colors::default_color_for(1));

        let mut payload = task_payload("Report");
        payload.category = Some(first.id);
        create_task(&pool, &payload).await.unwrap();
        create_task(&pool, &payload).await.unwrap();

        let categories = list_categories(&pool).await.unwrap();
        // Ordered by name.
        assert_eq!(categories[0].category.name, "Errands");
        assert_eq!(categories[0].task_count, 0);
        assert_eq!(categories[1].category.name, "Work");
        assert_eq!(categories[1].task_count, 2);

        assert!(category_exists(&pool, first.id).await.unwrap());
        assert!(!category_exists(&pool, 4242).await.unwrap());
    }

    #[tokio::test]
    async fn test_category_name_uniqueness() {
        let pool = setup_test_db().await;
        let work = create_category(&pool, &category_payload("Work")).await.unwrap();

        assert!(category_name_taken(&pool, "Work", None).await.unwrap());
        assert!(!category_name_taken(&pool, "Work", Some(work.id)).await.unwrap());
        assert!(!category_name_taken(&pool, "Leisure", None).await.unwrap());

        // The UNIQUE constraint backs the check up.
        assert!(create_category(&pool, &category_payload("Work")).await.is_err());
    }

    #[tokio::test]
    async fn test_update_category_keeps_color_when_missing() {
        let pool = setup_test_db().await;
        let work = create_category(
            &pool,
            &CategoryPayload {
                name: "Work".to_string(),
                color: Some("#123456".to_string()),
            },
        )
        .await
        .unwrap();

        let updated = update_category(&pool, work.id, &category_payload("Office"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.category.name, "Office");
        assert_eq!(updated.category.color, "#123456");
        assert!(update_category(&pool, 77, &category_payload("Ghost")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filters() {
        let pool = setup_test_db().await;
        let work = create_category(&pool, &category_payload("Work")).await.unwrap();

        let mut a = task_payload("Write quarterly report");
        a.category = Some(work.id);
        a.priority = Priority::High;
        create_task(&pool, &a).await.unwrap();

        let mut b = task_payload("Buy groceries");
        b.status = TaskStatus::Done;
        b.description = Some("milk, eggs, 100% juice".to_string());
        create_task(&pool, &b).await.unwrap();

        let mut c = task_payload("Renew passport");
        c.due_date = Some(today() - Duration::days(3));
        create_task(&pool, &c).await.unwrap();

        let by_status = TaskCriteria {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        let tasks = all_tasks(&pool, &by_status).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Buy groceries");

        let by_category = TaskCriteria {
            category: Some(CategoryFilter::Id(work.id)),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &by_category).await.len(), 1);

        let uncategorized = TaskCriteria {
            category: Some(CategoryFilter::Uncategorized),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &uncategorized).await.len(), 2);

        let search = TaskCriteria {
            search: Some("REPORT".to_string()),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &search).await[0].title, "Write quarterly report");

        // `%` is matched literally.
        let literal = TaskCriteria {
            search: Some("100%".to_string()),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &literal).await.len(), 1);
        let wildcard = TaskCriteria {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &wildcard).await.len(), 1);

        let overdue = TaskCriteria {
            overdue: Some(true),
            ..Default::default()
        };
        let tasks = all_tasks(&pool, &overdue).await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "Renew passport");

        let not_overdue = TaskCriteria {
            overdue: Some(false),
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &not_overdue).await.len(), 2);
        assert_eq!(count_tasks(&pool, &not_overdue, today()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_default_ordering() {
        let pool = setup_test_db().await;

        let mut low = task_payload("Low");
        low.priority = Priority::Low;
        create_task(&pool, &low).await.unwrap();

        let mut high_later = task_payload("High later");
        high_later.priority = Priority::High;
        high_later.due_date = Some(today() + Duration::days(10));
        create_task(&pool, &high_later).await.unwrap();

        let mut high_undated = task_payload("High undated");
        high_undated.priority = Priority::High;
        create_task(&pool, &high_undated).await.unwrap();

        let mut high_soon = task_payload("High soon");
        high_soon.priority = Priority::High;
        high_soon.due_date = Some(today() + Duration::days(1));
        create_task(&pool, &high_soon).await.unwrap();

        let titles: Vec<String> = all_tasks(&pool, &TaskCriteria::default())
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, ["High soon", "High later", "High undated", "Low"]);

        let by_title = TaskCriteria {
            ordering: TaskOrdering::TitleAsc,
            ..Default::default()
        };
        assert_eq!(all_tasks(&pool, &by_title).await[0].title, "High later");
    }

    #[tokio::test]
    async fn test_pagination_limits() {
        let pool = setup_test_db().await;
        for i in 0..7 {
            create_task(&pool, &task_payload(&format!("Task {i}"))).await.unwrap();
        }
        let criteria = TaskCriteria {
            ordering: TaskOrdering::CreatedAsc,
            ..Default::default()
        };
        let page = list_tasks(&pool, &criteria, today(), 3, 6).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Task 6");
        assert_eq!(count_tasks(&pool, &criteria, today()).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_recent_and_overdue_tasks() {
        let pool = setup_test_db().await;
        let mut late = task_payload("Late");
        late.due_date = Some(today() - Duration::days(1));
        create_task(&pool, &late).await.unwrap();

        let mut later = task_payload("Very late");
        later.due_date = Some(today() - Duration::days(5));
        create_task(&pool, &later).await.unwrap();

        let mut done = task_payload("Late but done");
        done.due_date = Some(today() - Duration::days(5));
        done.status = TaskStatus::Done;
        create_task(&pool, &done).await.unwrap();

        let overdue = overdue_tasks(&pool, today()).await.unwrap();
        let titles: Vec<&str> = overdue.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Very late", "Late"]);

        let recent = recent_tasks(&pool, today(), 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "Late but done");
    }

    #[tokio::test]
    async fn test_task_stats() {
        let pool = setup_test_db().await;

        let empty = task_stats(&pool, today()).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.completion_rate, 0.0);

        let work = create_category(&pool, &category_payload("Work")).await.unwrap();
        let mut a = task_payload("A");
        a.category = Some(work.id);
        a.priority = Priority::High;
        a.status = TaskStatus::Done;
        create_task(&pool, &a).await.unwrap();

        let mut b = task_payload("B");
        b.status = TaskStatus::InProgress;
        b.due_date = Some(today() - Duration::days(2));
        create_task(&pool, &b).await.unwrap();

        let mut c = task_payload("C");
        c.priority = Priority::Low;
        create_task(&pool, &c).await.unwrap();

        let stats = task_stats(&pool, today()).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.todo, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.done, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.completion_rate, 33.3);
        assert_eq!(
            stats.by_priority,
            PriorityCounts {
                low: 1,
                medium: 1,
                high: 1
            }
        );
        assert_eq!(stats.uncategorized, 2);
        assert_eq!(stats.by_category.len(), 1);
        assert_eq!(stats.by_category[0].name, "Work");
        assert_eq!(stats.by_category[0].count, 1);
    }

    #[tokio::test]
    async fn test_in_memory_pool_never_recycles_its_connection() {
        let pool = setup_test_db().await;
        let options = pool.options();
        assert_eq!(options.get_max_connections(), 1);
        assert_eq!(options.get_idle_timeout(), None);
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[tokio::test]
    async fn test_pool_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("taskboard.db");
        let url = format!("sqlite://{}", db_path.display());

        let pool = establish_connection_pool(&url).await.unwrap();
        create_task(&pool, &task_payload("Persisted")).await.unwrap();
        pool.close().await;
        assert!(db_path.exists());

        // Opening again keeps the data and re-applies the schema harmlessly.
        let pool = establish_connection_pool(&url).await.unwrap();
        assert_eq!(count_tasks(&pool, &TaskCriteria::default(), today()).await.unwrap(), 1);
    }
}
