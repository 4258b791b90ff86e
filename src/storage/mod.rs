pub mod event_log;

use anyhow::{Context as _, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqliteConnection, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

use crate::board::error::BoardError;
use crate::board::model::{CreateTask, ReorderRequest, Status, Task, TaskPatch};
use event_log::{EventType, TaskEventRow};

/// Default timeout for a storage operation (a read or a whole transaction).
/// Prevents a hung query from blocking the daemon indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, BoardError>>,
) -> Result<T, BoardError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(BoardError::Storage(sqlx::Error::PoolTimedOut)),
    }
}

// ─── Row type ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: String,
    status: String,
    priority: String,
    sort_order: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = BoardError;

    /// Stored enum strings are re-validated on every read.
    fn try_from(row: TaskRow) -> Result<Task, BoardError> {
        Ok(Task {
            status: Status::parse(&row.status)?,
            priority: crate::board::model::Priority::parse(&row.priority)?,
            id: row.id,
            title: row.title,
            description: row.description,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ─── BoardStore ──────────────────────────────────────────────────────────────

/// Durable store for tasks and their audit events.
///
/// Owns all Task and TaskEvent persistence; every mutating operation runs in
/// one transaction so the task-state change and its audit event commit
/// together or not at all.
#[derive(Clone)]
pub struct BoardStore {
    pool: SqlitePool,
}

impl BoardStore {
    pub async fn open(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("board.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!("src/storage/migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    // ─── Ordering engine ────────────────────────────────────────────────────

    /// Append position for a single insert or move into `status`:
    /// one past the column's current maximum, or 0 for an empty column.
    /// Bulk reorder bypasses this and assigns positional indices directly.
    async fn next_sort_order(
        conn: &mut SqliteConnection,
        status: Status,
    ) -> Result<i64, BoardError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM tasks WHERE status = ?",
        )
        .bind(status.as_str())
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    // ─── Tasks ──────────────────────────────────────────────────────────────

    /// All tasks, in arbitrary order; column grouping is a display concern.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, BoardError> {
        with_timeout(async {
            let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM tasks")
                .fetch_all(&self.pool)
                .await?;
            rows.into_iter().map(Task::try_from).collect()
        })
        .await
    }

    pub async fn get_task(&self, id: &str) -> Result<Option<Task>, BoardError> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Task::try_from).transpose()
    }

    /// Insert a new task at the end of the `todo` column and log its
    /// `created` event. Input must already be validated.
    pub async fn create_task(&self, req: &CreateTask) -> Result<Task, BoardError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        with_timeout(async {
            let mut tx = self.pool.begin().await?;
            let sort_order = Self::next_sort_order(&mut *tx, Status::Todo).await?;
            sqlx::query(
                "INSERT INTO tasks (id, title, description, status, priority, sort_order, created_at, updated_at)
                 VALUES (?, ?, ?, 'todo', ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&req.title)
            .bind(&req.description)
            .bind(req.priority.as_str())
            .bind(sort_order)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            event_log::record_event(
                &mut *tx,
                &id,
                EventType::Created,
                None,
                Some(Status::Todo),
                &now,
            )
            .await?;
            tx.commit().await?;

            Ok(Task {
                id,
                title: req.title.clone(),
                description: req.description.clone(),
                status: Status::Todo,
                priority: req.priority,
                sort_order,
                created_at: now.clone(),
                updated_at: now,
            })
        })
        .await
    }

    /// Apply a partial update. A status change re-appends the task at the end
    /// of the target column and logs `moved`; any other edit logs `updated`.
    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, BoardError> {
        let now = Utc::now().to_rfc3339();

        with_timeout(async {
            let mut tx = self.pool.begin().await?;
            let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            let mut task = row
                .map(Task::try_from)
                .transpose()?
                .ok_or_else(|| BoardError::NotFound(id.to_string()))?;

            let from_status = task.status;

            if let Some(title) = &patch.title {
                task.title = title.clone();
            }
            if let Some(description) = &patch.description {
                task.description = description.clone();
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            let moved = match patch.status {
                Some(status) if status != task.status => {
                    task.status = status;
                    task.sort_order = Self::next_sort_order(&mut *tx, status).await?;
                    true
                }
                _ => false,
            };
            task.updated_at = now.clone();

            sqlx::query(
                "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, sort_order = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.priority.as_str())
            .bind(task.sort_order)
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            if moved {
                event_log::record_event(
                    &mut *tx,
                    id,
                    EventType::Moved,
                    Some(from_status),
                    Some(task.status),
                    &now,
                )
                .await?;
            } else {
                event_log::record_event(&mut *tx, id, EventType::Updated, None, None, &now).await?;
            }
            tx.commit().await?;

            Ok(task)
        })
        .await
    }

    /// Hard delete. The `deleted` event is logged first, then the row is
    /// removed — the cascade erases the event along with the rest of the
    /// task's history, so no tombstone survives.
    pub async fn delete_task(&self, id: &str) -> Result<(), BoardError> {
        let now = Utc::now().to_rfc3339();

        with_timeout(async {
            let mut tx = self.pool.begin().await?;
            let row: Option<(String,)> = sqlx::query_as("SELECT status FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            let status = match row {
                Some((s,)) => Status::parse(&s)?,
                None => return Err(BoardError::NotFound(id.to_string())),
            };

            event_log::record_event(&mut *tx, id, EventType::Deleted, Some(status), None, &now)
                .await?;
            sqlx::query("DELETE FROM tasks WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Apply a client-supplied full ordering: every listed id is forced into
    /// its column with sort_order = positional index. Unknown ids are skipped;
    /// tasks listed nowhere are left untouched. All three columns commit in
    /// one transaction so observers never see a partial reorder.
    ///
    /// No per-task events are logged on this path — the bulk reorder audit
    /// gap is intentional and preserved.
    pub async fn reorder(&self, req: &ReorderRequest) -> Result<Vec<Task>, BoardError> {
        let now = Utc::now().to_rfc3339();

        with_timeout(async {
            let mut tx = self.pool.begin().await?;
            for (status, ids) in req.columns() {
                for (position, id) in ids.iter().enumerate() {
                    sqlx::query(
                        "UPDATE tasks SET status = ?, sort_order = ?, updated_at = ? WHERE id = ?",
                    )
                    .bind(status.as_str())
                    .bind(position as i64)
                    .bind(&now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
            tx.commit().await?;
            Ok(())
        })
        .await?;

        self.list_tasks().await
    }

    // ─── Audit trail ────────────────────────────────────────────────────────

    pub async fn events_for_task(&self, id: &str) -> Result<Vec<TaskEventRow>, BoardError> {
        event_log::events_for_task(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stalled_storage_operation_times_out_as_a_storage_error() {
        let err = with_timeout(std::future::pending::<Result<(), BoardError>>())
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Storage(sqlx::Error::PoolTimedOut)));
    }
}
