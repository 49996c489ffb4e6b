//! Undo/redo over collection mutations.
//!
//! Commands capture whole-collection snapshots rather than field diffs:
//! restoring a snapshot can never leave the collection half-reverted, at
//! the cost of O(collection size) memory per command. The history is
//! session-only and is not persisted.

use std::fmt;

use crate::collection::{CollectionSnapshot, TaskCollection};
use crate::task::TaskId;

/// A reversible mutation of a [`TaskCollection`].
pub trait UndoableCommand {
    fn execute(&mut self, collection: &mut TaskCollection);
    fn undo(&mut self, collection: &mut TaskCollection);
    fn redo(&mut self, collection: &mut TaskCollection);
}

/// Which step action a [`StepCommand`] replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOp {
    Complete,
    Skip,
}

/// Direct-method command: snapshots the collection before mutating, then
/// completes or skips the target task's next step. Redo replays the method;
/// undo restores the snapshot.
pub struct StepCommand {
    task_id: TaskId,
    op: StepOp,
    before: Option<CollectionSnapshot>,
}

impl StepCommand {
    /// A command that completes the task's next step.
    pub fn complete(task_id: impl Into<TaskId>) -> Self {
        StepCommand {
            task_id: task_id.into(),
            op: StepOp::Complete,
            before: None,
        }
    }

    /// A command that skips the task's next step.
    pub fn skip(task_id: impl Into<TaskId>) -> Self {
        StepCommand {
            task_id: task_id.into(),
            op: StepOp::Skip,
            before: None,
        }
    }

    fn apply(&self, collection: &mut TaskCollection) {
        match self.op {
            StepOp::Complete => collection.complete_next_step(&self.task_id),
            StepOp::Skip => collection.skip_next_step(&self.task_id),
        };
    }
}

impl UndoableCommand for StepCommand {
    fn execute(&mut self, collection: &mut TaskCollection) {
        self.before = Some(collection.snapshot());
        self.apply(collection);
    }

    fn undo(&mut self, collection: &mut TaskCollection) {
        if let Some(snapshot) = self.before.clone() {
            collection.restore(snapshot);
        }
    }

    fn redo(&mut self, collection: &mut TaskCollection) {
        self.apply(collection);
    }
}

/// Generic edit command: wraps an arbitrary action and captures snapshots
/// on both sides of its first execution, so undo and redo are pure
/// snapshot restores.
pub struct EditCommand {
    action: Box<dyn FnMut(&mut TaskCollection)>,
    before: Option<CollectionSnapshot>,
    after: Option<CollectionSnapshot>,
}

impl EditCommand {
    pub fn new(action: impl FnMut(&mut TaskCollection) + 'static) -> Self {
        EditCommand {
            action: Box::new(action),
            before: None,
            after: None,
        }
    }
}

impl UndoableCommand for EditCommand {
    fn execute(&mut self, collection: &mut TaskCollection) {
        self.before = Some(collection.snapshot());
        (self.action)(collection);
        self.after = Some(collection.snapshot());
    }

    fn undo(&mut self, collection: &mut TaskCollection) {
        if let Some(snapshot) = self.before.clone() {
            collection.restore(snapshot);
        }
    }

    fn redo(&mut self, collection: &mut TaskCollection) {
        if let Some(snapshot) = self.after.clone() {
            collection.restore(snapshot);
        }
    }
}

/// Two-stack undo/redo history.
#[derive(Default)]
pub struct History {
    undo_stack: Vec<Box<dyn UndoableCommand>>,
    redo_stack: Vec<Box<dyn UndoableCommand>>,
}

impl History {
    pub fn new() -> Self {
        History {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Run a command and record it. Any redoable future is discarded.
    pub fn execute(
        &mut self,
        mut command: Box<dyn UndoableCommand>,
        collection: &mut TaskCollection,
    ) {
        command.execute(collection);
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    /// Reverse the most recent command. No-op on an empty stack.
    pub fn undo(&mut self, collection: &mut TaskCollection) -> bool {
        let Some(mut command) = self.undo_stack.pop() else {
            return false;
        };
        command.undo(collection);
        self.redo_stack.push(command);
        true
    }

    /// Replay the most recently undone command. No-op on an empty stack.
    pub fn redo(&mut self, collection: &mut TaskCollection) -> bool {
        let Some(mut command) = self.redo_stack.pop() else {
            return false;
        };
        command.redo(collection);
        self.undo_stack.push(command);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .finish()
    }
}
