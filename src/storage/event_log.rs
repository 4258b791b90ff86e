//! Append-only audit trail for task lifecycle transitions.
//!
//! One `task_events` row is written per mutating operation, inside the same
//! transaction as the task-state change it documents — event and state commit
//! together or neither does. Rows are never updated or deleted directly; they
//! disappear only via cascade when their task is hard-deleted.

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::board::error::BoardError;
use crate::board::model::Status;

// ─── Event type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
    Updated,
    Moved,
    Deleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "created",
            EventType::Updated => "updated",
            EventType::Moved => "moved",
            EventType::Deleted => "deleted",
        }
    }
}

// ─── Row type ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TaskEventRow {
    pub id: i64,
    pub task_id: String,
    pub event_type: String,
    pub from_status: Option<String>,
    pub to_status: Option<String>,
    pub at: String,
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Record one lifecycle event for `task_id` on an open transaction.
///
/// `from_status`/`to_status` are populated only for transitions (`created`,
/// `moved`, `deleted`); plain field edits log `updated` with both left null.
pub async fn record_event(
    conn: &mut SqliteConnection,
    task_id: &str,
    event_type: EventType,
    from_status: Option<Status>,
    to_status: Option<Status>,
    at: &str,
) -> Result<(), BoardError> {
    sqlx::query(
        "INSERT INTO task_events (task_id, event_type, from_status, to_status, at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(task_id)
    .bind(event_type.as_str())
    .bind(from_status.map(|s| s.as_str()))
    .bind(to_status.map(|s| s.as_str()))
    .bind(at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Audit history for one task, oldest first. Not part of the board's
/// load-bearing surface — used by tests and future history views.
pub async fn events_for_task(
    pool: &SqlitePool,
    task_id: &str,
) -> Result<Vec<TaskEventRow>, BoardError> {
    Ok(
        sqlx::query_as("SELECT * FROM task_events WHERE task_id = ? ORDER BY id ASC")
            .bind(task_id)
            .fetch_all(pool)
            .await?,
    )
}
