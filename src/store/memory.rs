use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewTaskRequest, Session, Task, UpdateTaskRequest};

use super::TaskStore;

struct Row {
    task: Task,
    seq: u64,
}

/// In-memory stand-in for the remote store. Mirrors its contract: rows are
/// scoped to their owner, mutations that match no visible row succeed
/// without effect, and `updated_at` is stamped on every mutation.
pub struct MemoryTaskStore {
    rows: Mutex<Vec<Row>>,
    next_seq: Mutex<u64>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_seq: Mutex::new(0),
        }
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, session: &Session) -> Result<Vec<Task>, AppError> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut visible: Vec<&Row> = rows
            .iter()
            .filter(|r| r.task.user_id == session.user_id)
            .collect();
        // created_at descending; the seq counter breaks same-instant ties.
        visible.sort_by(|a, b| {
            b.task
                .created_at
                .cmp(&a.task.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(visible.into_iter().map(|r| r.task.clone()).collect())
    }

    async fn insert(&self, session: &Session, task: NewTaskRequest) -> Result<(), AppError> {
        if task.user_id != session.user_id {
            return Err(AppError::Store(
                "new row violates row-level security policy for table \"todos\"".to_string(),
            ));
        }

        let now = Utc::now();
        let seq = {
            let mut next = self.next_seq.lock().unwrap_or_else(|e| e.into_inner());
            *next += 1;
            *next
        };

        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.push(Row {
            task: Task {
                id: Uuid::new_v4(),
                user_id: task.user_id,
                title: task.title,
                description: task.description,
                completed: false,
                due_date: task.due_date,
                created_at: now,
                updated_at: now,
            },
            seq,
        });
        Ok(())
    }

    async fn update(
        &self,
        session: &Session,
        id: Uuid,
        changes: UpdateTaskRequest,
    ) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.task.id == id && r.task.user_id == session.user_id)
        {
            row.task.title = changes.title;
            row.task.description = changes.description;
            row.task.due_date = changes.due_date;
            row.task.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_completed(
        &self,
        session: &Session,
        id: Uuid,
        completed: bool,
    ) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(row) = rows
            .iter_mut()
            .find(|r| r.task.id == id && r.task.user_id == session.user_id)
        {
            row.task.completed = completed;
            row.task.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, session: &Session, id: Uuid) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        rows.retain(|r| !(r.task.id == id && r.task.user_id == session.user_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_for(user_id: Uuid) -> Session {
        Session {
            access_token: "t".to_string(),
            refresh_token: "r".to_string(),
            user_id,
            email: "a@example.com".to_string(),
        }
    }

    fn new_task(user_id: Uuid, title: &str) -> NewTaskRequest {
        NewTaskRequest {
            user_id,
            title: title.to_string(),
            description: None,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryTaskStore::new();
        let session = session_for(Uuid::new_v4());

        store
            .insert(&session, new_task(session.user_id, "first"))
            .await
            .expect("insert");
        store
            .insert(&session, new_task(session.user_id, "second"))
            .await
            .expect("insert");

        let tasks = store.list(&session).await.expect("list");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "second");
        assert_eq!(tasks[1].title, "first");
    }

    #[tokio::test]
    async fn test_rows_are_scoped_to_owner() {
        let store = MemoryTaskStore::new();
        let alice = session_for(Uuid::new_v4());
        let bob = session_for(Uuid::new_v4());

        store
            .insert(&alice, new_task(alice.user_id, "alice's"))
            .await
            .expect("insert");

        assert!(store.list(&bob).await.expect("list").is_empty());
        assert_eq!(store.list(&alice).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_mutation_is_a_silent_noop() {
        let store = MemoryTaskStore::new();
        let alice = session_for(Uuid::new_v4());
        let bob = session_for(Uuid::new_v4());

        store
            .insert(&alice, new_task(alice.user_id, "alice's"))
            .await
            .expect("insert");
        let id = store.list(&alice).await.expect("list")[0].id;

        // No visible row match for bob, so both calls succeed without effect.
        store
            .set_completed(&bob, id, true)
            .await
            .expect("set_completed");
        store.delete(&bob, id).await.expect("delete");

        let tasks = store.list(&alice).await.expect("list");
        assert_eq!(tasks.len(), 1);
        assert!(!tasks[0].completed);
    }

    #[tokio::test]
    async fn test_insert_for_other_owner_is_rejected() {
        let store = MemoryTaskStore::new();
        let alice = session_for(Uuid::new_v4());

        let result = store
            .insert(&alice, new_task(Uuid::new_v4(), "not mine"))
            .await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_update_stamps_updated_at() {
        let store = MemoryTaskStore::new();
        let session = session_for(Uuid::new_v4());

        store
            .insert(&session, new_task(session.user_id, "before"))
            .await
            .expect("insert");
        let task = store.list(&session).await.expect("list").remove(0);

        store
            .update(
                &session,
                task.id,
                UpdateTaskRequest {
                    title: "after".to_string(),
                    description: Some("notes".to_string()),
                    due_date: None,
                },
            )
            .await
            .expect("update");

        let updated = store.list(&session).await.expect("list").remove(0);
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "after");
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }
}
