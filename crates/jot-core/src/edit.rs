use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::task::{Priority, TaskPatch};

/// Tracks the single task currently in inline-edit mode. Not persisted; a
/// fresh session starts idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSession {
    target: Option<Uuid>,
}

impl EditSession {
    /// Starting a new edit while another is active replaces the tracked id.
    pub fn begin(&mut self, id: Uuid) {
        if let Some(prior) = self.target
            && prior != id
        {
            debug!(%prior, "replacing active edit target");
        }
        self.target = Some(id);
    }

    pub fn cancel(&mut self) {
        self.target = None;
    }

    pub fn target(&self) -> Option<Uuid> {
        self.target
    }

    pub fn is_editing(&self, id: Uuid) -> bool {
        self.target == Some(id)
    }

    /// Ends the session, handing back whichever id it was tracking.
    pub fn finish(&mut self) -> Option<Uuid> {
        self.target.take()
    }
}

/// The fields handed over when an edit is saved. Unset fields fall back to
/// the form defaults: empty description, low priority, no due date.
#[derive(Debug, Clone, Default)]
pub struct EditSubmission {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<NaiveDate>,
}

impl EditSubmission {
    /// A title that is blank after trimming drops the whole save.
    pub fn into_patch(self) -> Option<TaskPatch> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return None;
        }
        Some(TaskPatch {
            title: Some(title),
            description: Some(self.description.unwrap_or_default()),
            priority: Some(self.priority.unwrap_or(Priority::Low)),
            due: Some(self.due),
            completed: None,
        })
    }
}
