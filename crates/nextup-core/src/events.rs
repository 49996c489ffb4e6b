//! Change notifications emitted by the task collection.
//!
//! Every observable mutation of a [`TaskCollection`](crate::TaskCollection)
//! produces a [`ChangeEvent`]. A persistence layer registers a
//! [`ChangeListener`] at construction to learn when to save; the listener is
//! invoked by the mutator itself, after the state change has been applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// A state change in the task collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChangeEvent {
    TaskAdded {
        task_id: TaskId,
    },
    TaskRemoved {
        task_id: TaskId,
    },
    StepAdded {
        task_id: TaskId,
        step: String,
    },
    /// A step was completed; `step` is `None` when the task had no steps
    /// and was completed directly.
    StepCompleted {
        task_id: TaskId,
        step: Option<String>,
    },
    /// A step was skipped; `step` is `None` when the task had no steps and
    /// was skipped directly.
    StepSkipped {
        task_id: TaskId,
        step: Option<String>,
    },
    StepsEdited {
        task_id: TaskId,
    },
    /// A timing attribute or other task field changed.
    TaskEdited {
        task_id: TaskId,
    },
    /// A recurring task rolled over into its next occurrence.
    TaskRolledOver {
        task_id: TaskId,
        at: DateTime<Utc>,
    },
    /// The blackout windows were replaced.
    WindowsChanged,
    /// The whole collection was replaced from a snapshot.
    Restored,
}

/// Observer interface for collection mutations.
pub trait ChangeListener {
    fn on_change(&mut self, event: &ChangeEvent);
}
