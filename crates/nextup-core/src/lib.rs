//! # Nextup Core Library
//!
//! Core engine for Nextup, a personal task scheduler. Given a pool of
//! tasks with deadlines, effort estimates, optional recurrence, and
//! mandatory/optional status, the engine tracks each task's progress
//! through an ordered list of steps, decides at any instant which single
//! task is most urgent to work on, and lets every edit be reversed and
//! replayed through an undo history.
//!
//! The library is deliberately clock-free and I/O-free: every
//! time-dependent operation takes `now` from the caller, recurrence
//! rollover is driven by an external periodic `tick`, and persistence
//! happens through snapshot round-trips owned by the embedding
//! application.
//!
//! ## Key Components
//!
//! - [`Task`]: step state machine with timing attributes and recurrence
//! - [`TaskCollection`]: owns the task pool, the blackout windows, and the
//!   synthetic sleep task
//! - [`Scheduler`]: multi-criteria prioritizer over the pool
//! - [`History`]: snapshot-based two-stack undo/redo
//! - [`TimeWindow`] / [`DateRange`] / [`RecurringDateRange`]: calendar
//!   arithmetic, including blackout subtraction and periodic containment

pub mod clock;
pub mod collection;
pub mod error;
pub mod events;
pub mod history;
pub mod range;
pub mod scheduler;
pub mod task;

pub use clock::{Time, TimeWindow};
pub use collection::{CollectionSnapshot, TaskCollection};
pub use error::{CoreError, Result, TimeParseError, ValidationError};
pub use events::{ChangeEvent, ChangeListener};
pub use history::{EditCommand, History, StepCommand, UndoableCommand};
pub use range::{DateRange, RecurringDateRange};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerContext};
pub use task::{Step, StepAction, StepStatus, Task, TaskId};
