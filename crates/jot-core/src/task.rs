use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::datetime::calendar_date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Fixed sort ranks: low=1, medium=2, high=3.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "low" => Some(Priority::Low),
            "m" | "med" | "medium" => Some(Priority::Medium),
            "h" | "high" => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub priority: Priority,

    #[serde(default, rename = "dueDate", with = "calendar_date")]
    pub due: Option<NaiveDate>,

    pub completed: bool,
}

impl Task {
    pub fn new(
        title: String,
        description: String,
        priority: Priority,
        due: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            priority,
            due,
            completed: false,
        }
    }
}

/// Partial update applied by value-replacement. Fields left as `None` keep
/// their current value; the id is never touched. `due` is doubly optional so
/// "clear the due date" stays expressible.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due.is_none()
            && self.completed.is_none()
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due) = self.due {
            task.due = due;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}
