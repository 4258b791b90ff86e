use serde::{Deserialize, Serialize};

use crate::board::error::BoardError;

pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 5000;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// Board column. Doubles as the task's state value and its display lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "todo",
            Status::InProgress => "in_progress",
            Status::Done => "done",
        }
    }

    /// Parse a stored column value. Stored strings are never trusted blindly —
    /// an unknown value is a storage-level fault, not silently coerced.
    pub fn parse(s: &str) -> Result<Self, BoardError> {
        match s {
            "todo" => Ok(Status::Todo),
            "in_progress" => Ok(Status::InProgress),
            "done" => Ok(Status::Done),
            other => Err(BoardError::corrupt("status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Result<Self, BoardError> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(BoardError::corrupt("priority", other)),
        }
    }
}

// ─── Task DTO ────────────────────────────────────────────────────────────────

/// Wire-level task representation. Timestamps are RFC-3339 UTC strings,
/// exactly as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

// ─── Request payloads ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

impl CreateTask {
    /// Field-level validation. No state change happens on failure.
    pub fn validate(&self) -> Result<(), BoardError> {
        if self.title.is_empty() {
            return Err(BoardError::validation("title", "title must not be empty"));
        }
        if self.title.chars().count() > TITLE_MAX {
            return Err(BoardError::validation(
                "title",
                format!("title exceeds {TITLE_MAX} characters"),
            ));
        }
        if self.description.chars().count() > DESCRIPTION_MAX {
            return Err(BoardError::validation(
                "description",
                format!("description exceeds {DESCRIPTION_MAX} characters"),
            ));
        }
        Ok(())
    }
}

/// Partial update. Omitted fields are left unchanged; JSON `null` is treated
/// the same as omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), BoardError> {
        if let Some(title) = &self.title {
            if title.is_empty() {
                return Err(BoardError::validation("title", "title must not be empty"));
            }
            if title.chars().count() > TITLE_MAX {
                return Err(BoardError::validation(
                    "title",
                    format!("title exceeds {TITLE_MAX} characters"),
                ));
            }
        }
        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX {
                return Err(BoardError::validation(
                    "description",
                    format!("description exceeds {DESCRIPTION_MAX} characters"),
                ));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
    }
}

/// Bulk reorder: one ordered id list per column. Every listed task is forced
/// into that column with sort_order = its 0-based position. Unknown ids are
/// skipped, not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReorderRequest {
    #[serde(default)]
    pub todo: Vec<String>,
    #[serde(default)]
    pub in_progress: Vec<String>,
    #[serde(default)]
    pub done: Vec<String>,
}

impl ReorderRequest {
    /// The three column lists paired with their target status.
    pub fn columns(&self) -> [(Status, &[String]); 3] {
        [
            (Status::Todo, self.todo.as_slice()),
            (Status::InProgress, self.in_progress.as_slice()),
            (Status::Done, self.done.as_slice()),
        ]
    }
}

// ─── Push messages ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BoardState {
    pub tasks: Vec<Task>,
}

/// Everything the daemon pushes to connected viewers.
///
/// `snapshot` is sent to every viewer immediately on connect and after a bulk
/// reorder; the delta variants follow single-task mutations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardMessage {
    Created { task: Task },
    Updated { task: Task },
    Deleted { task_id: String },
    Snapshot { state: BoardState },
}

impl BoardMessage {
    pub fn snapshot(tasks: Vec<Task>) -> Self {
        BoardMessage::Snapshot {
            state: BoardState { tasks },
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
