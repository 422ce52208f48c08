use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::Task;

/// Transient field values while the add/edit form is open. Never persisted;
/// the task snapshot itself is not patched until the store confirms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl Draft {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            due_date: task.due_date.map(|d| d.date_naive()),
        }
    }
}

/// Edit-form state machine: Idle -> Creating | Editing(id) -> Idle on
/// successful submit or explicit cancel. A failed submit keeps the draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormState {
    #[default]
    Idle,
    Creating(Draft),
    Editing {
        id: Uuid,
        draft: Draft,
    },
}

impl FormState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FormState::Idle)
    }

    pub fn draft(&self) -> Option<&Draft> {
        match self {
            FormState::Idle => None,
            FormState::Creating(draft) => Some(draft),
            FormState::Editing { draft, .. } => Some(draft),
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match self {
            FormState::Idle => None,
            FormState::Creating(draft) => Some(draft),
            FormState::Editing { draft, .. } => Some(draft),
        }
    }
}
