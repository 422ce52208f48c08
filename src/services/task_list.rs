use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Filter, NewTaskRequest, Session, Task, UpdateTaskRequest};
use crate::store::TaskStore;

use super::form::{Draft, FormState};

/// Mediates every task operation against the store and keeps the in-memory
/// snapshot consistent by re-fetching after each mutation.
///
/// The snapshot is replaced wholesale, never patched in place. Operations
/// require a present session and refuse to act without one. Any collaborator
/// failure is recorded as the single current-error text, the operation
/// aborts, and the trailing re-fetch is skipped.
pub struct TaskList {
    store: Arc<dyn TaskStore>,
    session: Option<Session>,
    tasks: Vec<Task>,
    filter: Filter,
    error: Option<String>,
    form: FormState,
}

impl TaskList {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            session: None,
            tasks: Vec::new(),
            filter: Filter::All,
            error: None,
            form: FormState::Idle,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.form.draft_mut()
    }

    /// Replaces the tracked session. A none-to-present transition (or a
    /// switch to a different user) fetches the collection; a transition to
    /// none clears it without a store call.
    pub async fn set_session(&mut self, session: Option<Session>) {
        let previous_user = self.session.as_ref().map(|s| s.user_id);
        let next_user = session.as_ref().map(|s| s.user_id);
        self.session = session;

        match (previous_user, next_user) {
            (None, Some(_)) => self.refresh().await,
            (Some(_), None) => {
                self.tasks.clear();
                self.form = FormState::Idle;
            }
            (Some(a), Some(b)) if a != b => self.refresh().await,
            // A same-user replacement is a token refresh; the snapshot
            // stays valid.
            _ => {}
        }
    }

    /// Fetches the owner's full collection, newest first. On failure the
    /// previous snapshot stays visible.
    pub async fn refresh(&mut self) {
        let Some(session) = self.session.clone() else {
            debug!("refresh ignored: no session");
            return;
        };

        match self.store.list(&session).await {
            Ok(tasks) => {
                self.tasks = tasks;
                self.error = None;
            }
            Err(e) => self.record_error(e),
        }
    }

    pub async fn create(
        &mut self,
        title: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
    ) -> bool {
        let Some(session) = self.session.clone() else {
            debug!("create ignored: no session");
            return false;
        };

        let title = match normalize_title(title) {
            Ok(t) => t,
            Err(e) => {
                self.record_error(e);
                return false;
            }
        };

        let request = NewTaskRequest {
            user_id: session.user_id,
            title,
            description: normalize_description(description),
            due_date: normalize_due_date(due_date),
        };

        if let Err(e) = self.store.insert(&session, request).await {
            self.record_error(e);
            return false;
        }

        self.refresh().await;
        true
    }

    pub async fn update(
        &mut self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        due_date: Option<NaiveDate>,
    ) -> bool {
        let Some(session) = self.session.clone() else {
            debug!("update ignored: no session");
            return false;
        };

        let title = match normalize_title(title) {
            Ok(t) => t,
            Err(e) => {
                self.record_error(e);
                return false;
            }
        };

        let changes = UpdateTaskRequest {
            title,
            description: normalize_description(description),
            due_date: normalize_due_date(due_date),
        };

        if let Err(e) = self.store.update(&session, id, changes).await {
            self.record_error(e);
            return false;
        }

        self.refresh().await;
        true
    }

    pub async fn toggle_completed(&mut self, task: &Task) -> bool {
        let Some(session) = self.session.clone() else {
            debug!("toggle ignored: no session");
            return false;
        };

        if let Err(e) = self
            .store
            .set_completed(&session, task.id, !task.completed)
            .await
        {
            self.record_error(e);
            return false;
        }

        self.refresh().await;
        true
    }

    pub async fn remove(&mut self, id: Uuid) -> bool {
        let Some(session) = self.session.clone() else {
            debug!("remove ignored: no session");
            return false;
        };

        if let Err(e) = self.store.delete(&session, id).await {
            self.record_error(e);
            return false;
        }

        self.refresh().await;
        true
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// The filtered view of the last-fetched snapshot, order preserved.
    /// Purely local; the store is never consulted.
    pub fn visible(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| self.filter.matches(t))
            .collect()
    }

    pub fn open_create(&mut self) {
        if self.session.is_none() {
            debug!("open_create ignored: no session");
            return;
        }
        self.form = FormState::Creating(Draft::default());
    }

    /// Opens the edit form pre-filled from the task's current snapshot
    /// fields. Unknown ids are ignored.
    pub fn open_edit(&mut self, id: Uuid) {
        if self.session.is_none() {
            debug!("open_edit ignored: no session");
            return;
        }
        if let Some(task) = self.tasks.iter().find(|t| t.id == id) {
            self.form = FormState::Editing {
                id,
                draft: Draft::from_task(task),
            };
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = FormState::Idle;
    }

    /// Dispatches the open form to `create` or `update`. Returns to Idle
    /// only on success; a failed submit keeps the draft for correction.
    pub async fn submit_form(&mut self) -> bool {
        let submitted = match self.form.clone() {
            FormState::Idle => return false,
            FormState::Creating(draft) => {
                self.create(&draft.title, Some(&draft.description), draft.due_date)
                    .await
            }
            FormState::Editing { id, draft } => {
                self.update(id, &draft.title, Some(&draft.description), draft.due_date)
                    .await
            }
        };

        if submitted {
            self.form = FormState::Idle;
        }
        submitted
    }

    /// Records a failure raised outside the controller (the auth
    /// collaborator) into the same single-slot banner.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn record_error(&mut self, error: AppError) {
        debug!("operation failed: {}", error);
        self.error = Some(error.to_string());
    }
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn normalize_due_date(due_date: Option<NaiveDate>) -> Option<DateTime<Utc>> {
    due_date.map(|d| d.and_time(NaiveTime::MIN).and_utc())
}
