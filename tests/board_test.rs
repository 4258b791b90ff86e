//! Integration tests for the board service: ordering, partial updates,
//! column moves, the audit trail, hard deletes, and bulk reorder.

use std::sync::Arc;

use tempfile::TempDir;

use boardd::board::error::BoardError;
use boardd::board::model::{CreateTask, Priority, ReorderRequest, Status, TaskPatch};
use boardd::board::BoardService;
use boardd::realtime::ChannelRegistry;
use boardd::storage::BoardStore;

async fn make_board(dir: &TempDir) -> (BoardService, Arc<BoardStore>) {
    let store = Arc::new(BoardStore::open(dir.path()).await.unwrap());
    let registry = Arc::new(ChannelRegistry::new());
    (BoardService::new(store.clone(), registry), store)
}

fn new_task(title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: String::new(),
        priority: Priority::Normal,
    }
}

#[tokio::test]
async fn created_tasks_append_to_the_todo_column() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let a = board.create_task(new_task("a")).await.unwrap();
    let b = board.create_task(new_task("b")).await.unwrap();
    let c = board.create_task(new_task("c")).await.unwrap();

    assert_eq!(a.status, Status::Todo);
    assert_eq!((a.sort_order, b.sort_order, c.sort_order), (0, 1, 2));
}

#[tokio::test]
async fn create_then_list_round_trips_exact_field_values() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let created = board
        .create_task(CreateTask {
            title: "write the report".to_string(),
            description: "due friday".to_string(),
            priority: Priority::Urgent,
        })
        .await
        .unwrap();

    let listed = board.list_tasks().await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn empty_title_is_rejected_without_state_change() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let err = board.create_task(new_task("")).await.unwrap_err();
    assert!(matches!(err, BoardError::Validation { field: "title", .. }));
    assert!(board.list_tasks().await.unwrap().is_empty());

    let err = board
        .create_task(new_task(&"x".repeat(201)))
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::Validation { field: "title", .. }));
}

#[tokio::test]
async fn oversized_description_is_rejected_without_state_change() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let err = board
        .create_task(CreateTask {
            title: "a".to_string(),
            description: "x".repeat(5001),
            priority: Priority::Normal,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::Validation {
            field: "description",
            ..
        }
    ));
    assert!(board.list_tasks().await.unwrap().is_empty());

    // Same bound on the patch path; the stored task is untouched.
    let task = board.create_task(new_task("a")).await.unwrap();
    let err = board
        .update_task(
            &task.id,
            TaskPatch {
                description: Some("x".repeat(5001)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BoardError::Validation {
            field: "description",
            ..
        }
    ));
    assert_eq!(board.list_tasks().await.unwrap(), vec![task]);
}

#[tokio::test]
async fn description_only_update_keeps_column_and_order() {
    let dir = TempDir::new().unwrap();
    let (board, store) = make_board(&dir).await;

    let task = board.create_task(new_task("a")).await.unwrap();
    let updated = board
        .update_task(
            &task.id,
            TaskPatch {
                description: Some("more detail".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.status, task.status);
    assert_eq!(updated.sort_order, task.sort_order);
    assert_eq!(updated.description, "more detail");

    let events = store.events_for_task(&task.id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "created");
    assert_eq!(events[1].event_type, "updated");
    assert_eq!(events[1].from_status, None);
    assert_eq!(events[1].to_status, None);
}

#[tokio::test]
async fn status_change_appends_to_target_column_and_logs_moved() {
    let dir = TempDir::new().unwrap();
    let (board, store) = make_board(&dir).await;

    // Seed the done column so the append position is non-zero.
    let seed = board.create_task(new_task("seed")).await.unwrap();
    board
        .update_task(
            &seed.id,
            TaskPatch {
                status: Some(Status::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let task = board.create_task(new_task("a")).await.unwrap();
    let moved = board
        .update_task(
            &task.id,
            TaskPatch {
                status: Some(Status::Done),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.status, Status::Done);
    assert_eq!(moved.sort_order, 1); // one past the seeded task

    let events = store.events_for_task(&task.id).await.unwrap();
    let last = events.last().unwrap();
    assert_eq!(last.event_type, "moved");
    assert_eq!(last.from_status.as_deref(), Some("todo"));
    assert_eq!(last.to_status.as_deref(), Some("done"));
}

#[tokio::test]
async fn setting_the_same_status_logs_updated_not_moved() {
    let dir = TempDir::new().unwrap();
    let (board, store) = make_board(&dir).await;

    let task = board.create_task(new_task("a")).await.unwrap();
    let same = board
        .update_task(
            &task.id,
            TaskPatch {
                status: Some(Status::Todo),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(same.sort_order, task.sort_order);
    let events = store.events_for_task(&task.id).await.unwrap();
    assert_eq!(events.last().unwrap().event_type, "updated");
}

#[tokio::test]
async fn update_of_unknown_id_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let err = board
        .update_task("missing", TaskPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::NotFound(_)));

    let err = board.delete_task("missing").await.unwrap_err();
    assert!(matches!(err, BoardError::NotFound(_)));
}

#[tokio::test]
async fn delete_removes_the_task_and_its_whole_event_history() {
    let dir = TempDir::new().unwrap();
    let (board, store) = make_board(&dir).await;

    let task = board.create_task(new_task("a")).await.unwrap();
    board
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(store.events_for_task(&task.id).await.unwrap().len(), 2);

    board.delete_task(&task.id).await.unwrap();

    assert!(board.list_tasks().await.unwrap().is_empty());
    assert!(store.get_task(&task.id).await.unwrap().is_none());

    // Hard delete: the cascade erased the history, deleted event included.
    assert!(store.events_for_task(&task.id).await.unwrap().is_empty());
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM task_events")
        .fetch_one(&store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn reorder_applies_positional_indices_and_skips_the_unlisted() {
    let dir = TempDir::new().unwrap();
    let (board, store) = make_board(&dir).await;

    let a = board.create_task(new_task("a")).await.unwrap();
    let b = board.create_task(new_task("b")).await.unwrap();
    let untouched = board.create_task(new_task("c")).await.unwrap();

    board
        .reorder(ReorderRequest {
            todo: vec![b.id.clone(), a.id.clone(), "ghost-id".to_string()],
            in_progress: vec![],
            done: vec![],
        })
        .await
        .unwrap();

    let tasks = board.list_tasks().await.unwrap();
    let get = |id: &str| tasks.iter().find(|t| t.id == id).unwrap();

    assert_eq!(get(&b.id).sort_order, 0);
    assert_eq!(get(&a.id).sort_order, 1);
    assert_eq!(get(&a.id).status, Status::Todo);

    // A task listed in no column is left completely unmodified.
    assert_eq!(get(&untouched.id), &untouched);

    // The bulk path logs no per-task events (intentional audit gap).
    assert_eq!(store.events_for_task(&a.id).await.unwrap().len(), 1);
    assert_eq!(store.events_for_task(&b.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reorder_moves_tasks_between_columns() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    let a = board.create_task(new_task("a")).await.unwrap();
    let b = board.create_task(new_task("b")).await.unwrap();

    board
        .reorder(ReorderRequest {
            todo: vec![],
            in_progress: vec![a.id.clone()],
            done: vec![b.id.clone()],
        })
        .await
        .unwrap();

    let tasks = board.list_tasks().await.unwrap();
    let get = |id: &str| tasks.iter().find(|t| t.id == id).unwrap();
    assert_eq!(get(&a.id).status, Status::InProgress);
    assert_eq!(get(&a.id).sort_order, 0);
    assert_eq!(get(&b.id).status, Status::Done);
}

#[tokio::test]
async fn late_joining_viewer_sees_snapshot_before_any_delta() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;

    board.create_task(new_task("one")).await.unwrap();
    board.create_task(new_task("two")).await.unwrap();

    let (_, mut rx) = board.connect_viewer().await.unwrap();
    board.create_task(new_task("three")).await.unwrap();

    let first: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["type"], "snapshot");
    assert_eq!(first["state"]["tasks"].as_array().unwrap().len(), 2);

    let second: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(second["type"], "created");
    assert_eq!(second["task"]["title"], "three");
}

#[tokio::test]
async fn every_mutation_is_pushed_to_connected_viewers() {
    let dir = TempDir::new().unwrap();
    let (board, _) = make_board(&dir).await;
    let (_, mut rx) = board.connect_viewer().await.unwrap();
    rx.recv().await.unwrap(); // initial snapshot

    let task = board.create_task(new_task("a")).await.unwrap();
    board
        .update_task(
            &task.id,
            TaskPatch {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    board.delete_task(&task.id).await.unwrap();
    board.reorder(ReorderRequest::default()).await.unwrap();

    let types: Vec<String> = {
        let mut out = Vec::new();
        for _ in 0..4 {
            let msg: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            out.push(msg["type"].as_str().unwrap().to_string());
        }
        out
    };
    assert_eq!(types, ["created", "updated", "deleted", "snapshot"]);
}
