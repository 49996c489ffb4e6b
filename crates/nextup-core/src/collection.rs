//! The task collection: ownership, blackout windows, and the sleep task.
//!
//! `TaskCollection` owns every task exclusively. It carries two blackout
//! windows -- a daily asleep [`TimeWindow`] and a weekly downtime
//! [`RecurringDateRange`] -- plus one synthetic recurring sleep task whose
//! occurrence is derived from the asleep window. The collection owns no
//! clock and no timer: the caller drives recurrence rollover through
//! [`TaskCollection::tick`] and supplies `now` everywhere.
//!
//! Mutations go through collection methods, which notify the injected
//! [`ChangeListener`] after the state change has been applied.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::{Time, TimeWindow};
use crate::error::ValidationError;
use crate::events::{ChangeEvent, ChangeListener};
use crate::range::{DateRange, RecurringDateRange};
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerContext};
use crate::task::{Task, TaskId};

/// Deep snapshot of a collection, sufficient to restore behavior exactly.
///
/// Snapshots are owned clones; mutating the live collection never touches a
/// snapshot taken earlier. The undo history and the persistence layer both
/// rely on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    tasks: Vec<Task>,
    asleep: TimeWindow,
    downtime: RecurringDateRange,
    sleep_task_id: TaskId,
}

/// Owns the task pool and decides what to work on next.
pub struct TaskCollection {
    tasks: Vec<Task>,
    asleep: TimeWindow,
    downtime: RecurringDateRange,
    sleep_task_id: TaskId,
    scheduler: Scheduler,
    listener: Option<Box<dyn ChangeListener>>,
}

impl TaskCollection {
    /// Create a collection with the default blackout windows: asleep
    /// 00:00-08:00 daily, downtime Saturday 00:00 - Sunday 23:59 weekly.
    ///
    /// `now` anchors the sleep task's first occurrence and the downtime
    /// phase; the collection never reads a clock of its own.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_windows(
            now,
            TimeWindow::new(Time::MIDNIGHT, Time::from_hm(8, 0)),
            RecurringDateRange::weekend_of(now),
        )
    }

    /// Create a collection with custom blackout windows.
    pub fn with_windows(
        now: DateTime<Utc>,
        asleep: TimeWindow,
        downtime: RecurringDateRange,
    ) -> Self {
        let mut sleep_task = Task::new("Sleep");
        sleep_task.set_mandatory(true);
        project_sleep_task(&mut sleep_task, &asleep, now);
        let sleep_task_id = sleep_task.id().to_string();
        TaskCollection {
            tasks: vec![sleep_task],
            asleep,
            downtime,
            sleep_task_id,
            scheduler: Scheduler::new(),
            listener: None,
        }
    }

    /// Rehydrate a collection from a previously stored snapshot.
    pub fn from_snapshot(snapshot: CollectionSnapshot) -> Self {
        TaskCollection {
            tasks: snapshot.tasks,
            asleep: snapshot.asleep,
            downtime: snapshot.downtime,
            sleep_task_id: snapshot.sleep_task_id,
            scheduler: Scheduler::new(),
            listener: None,
        }
    }

    /// Register the change observer. Replaces any previous listener.
    pub fn set_listener(&mut self, listener: Box<dyn ChangeListener>) {
        self.listener = Some(listener);
    }

    /// Swap the scheduling policy.
    pub fn set_scheduler_config(&mut self, config: SchedulerConfig) {
        self.scheduler = Scheduler::with_config(config);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn asleep_window(&self) -> &TimeWindow {
        &self.asleep
    }

    pub fn downtime_window(&self) -> &RecurringDateRange {
        &self.downtime
    }

    pub fn sleep_task_id(&self) -> &str {
        &self.sleep_task_id
    }

    /// The task to present right now.
    ///
    /// Inside the asleep window the sleep task overrides everything;
    /// otherwise the scheduler picks from the pool.
    pub fn priority_task(&self, now: DateTime<Utc>) -> Option<&Task> {
        if self.asleep.is_in_window(&now) {
            return self.task(&self.sleep_task_id);
        }
        self.scheduler.most_important_task(
            &self.tasks,
            &SchedulerContext {
                now,
                asleep: &self.asleep,
                downtime: &self.downtime,
            },
        )
    }

    /// All workable tasks, most important first.
    pub fn ranked_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.scheduler.rank(
            &self.tasks,
            &SchedulerContext {
                now,
                asleep: &self.asleep,
                downtime: &self.downtime,
            },
        )
    }

    // ── Task lifecycle ───────────────────────────────────────────────

    /// Create and own a new task; returns its id.
    pub fn add_task(&mut self, description: impl Into<String>) -> TaskId {
        let task = Task::new(description);
        let id = task.id().to_string();
        self.tasks.push(task);
        self.notify(ChangeEvent::TaskAdded {
            task_id: id.clone(),
        });
        id
    }

    /// Remove a task. The sleep task refuses removal.
    pub fn remove_task(&mut self, id: &str) -> bool {
        if id == self.sleep_task_id {
            return false;
        }
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id() != id);
        let removed = self.tasks.len() != before;
        if removed {
            self.notify(ChangeEvent::TaskRemoved {
                task_id: id.to_string(),
            });
        }
        removed
    }

    /// Drop completed one-shot tasks. Recurring tasks roll over instead of
    /// dying, so they survive, as does the sleep task.
    pub fn prune_completed(&mut self) -> usize {
        let removed: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| t.is_complete() && !t.is_recurring())
            .map(|t| t.id().to_string())
            .collect();
        self.tasks
            .retain(|t| !(t.is_complete() && !t.is_recurring()));
        for task_id in &removed {
            self.notify(ChangeEvent::TaskRemoved {
                task_id: task_id.clone(),
            });
        }
        removed.len()
    }

    // ── Task mutators ────────────────────────────────────────────────

    /// Complete the task's next step. Returns false for an unknown id.
    pub fn complete_next_step(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        let step = task.next_step().map(String::from);
        task.complete_next_step();
        self.notify(ChangeEvent::StepCompleted {
            task_id: id.to_string(),
            step,
        });
        true
    }

    /// Skip the task's next step. Returns false for an unknown id.
    pub fn skip_next_step(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        let step = task.next_step().map(String::from);
        task.skip_next_step();
        self.notify(ChangeEvent::StepSkipped {
            task_id: id.to_string(),
            step,
        });
        true
    }

    pub fn add_step(&mut self, id: &str, text: impl Into<String>) -> bool {
        let text = text.into();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        task.add_step(text.clone());
        self.notify(ChangeEvent::StepAdded {
            task_id: id.to_string(),
            step: text,
        });
        true
    }

    pub fn replace_next_step(&mut self, id: &str, new_text: impl Into<String>) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        task.replace_next_step(new_text);
        self.notify(ChangeEvent::StepsEdited {
            task_id: id.to_string(),
        });
        true
    }

    pub fn edit_steps<S: AsRef<str>>(&mut self, id: &str, new_steps: &[S]) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        task.edit_steps(new_steps);
        self.notify(ChangeEvent::StepsEdited {
            task_id: id.to_string(),
        });
        true
    }

    /// Make a task recurring. Returns `Ok(false)` for an unknown id.
    pub fn make_recurring(
        &mut self,
        id: &str,
        period: Duration,
        interval_start: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return Ok(false);
        };
        task.make_recurring(period, interval_start)?;
        self.notify(ChangeEvent::TaskEdited {
            task_id: id.to_string(),
        });
        Ok(true)
    }

    /// Apply an arbitrary edit to one task through its methods, then
    /// notify. Returns false for an unknown id.
    pub fn edit_task(&mut self, id: &str, edit: impl FnOnce(&mut Task)) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        edit(task);
        self.notify(ChangeEvent::TaskEdited {
            task_id: id.to_string(),
        });
        true
    }

    // ── Blackout windows ─────────────────────────────────────────────

    /// Replace the daily asleep window and re-project the sleep task onto
    /// it.
    pub fn set_asleep_window(&mut self, window: TimeWindow, now: DateTime<Utc>) {
        self.asleep = window;
        let sleep_id = self.sleep_task_id.clone();
        if let Some(task) = self.tasks.iter_mut().find(|t| t.id() == sleep_id) {
            project_sleep_task(task, &window, now);
        }
        self.notify(ChangeEvent::WindowsChanged);
    }

    /// Replace the weekly downtime window.
    pub fn set_downtime_window(&mut self, downtime: RecurringDateRange) {
        self.downtime = downtime;
        self.notify(ChangeEvent::WindowsChanged);
    }

    // ── Clock driver ─────────────────────────────────────────────────

    /// Roll over every recurring task whose occurrence interval has fully
    /// elapsed. Safe to call at any frequency: the rollover advance is
    /// closed-form, so a second call with the same `now` changes nothing.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let mut rolled: Vec<TaskId> = Vec::new();
        for task in &mut self.tasks {
            if task.is_past_interval_end(now) {
                task.on_past_interval_end(now);
                rolled.push(task.id().to_string());
            }
        }
        for task_id in rolled {
            self.notify(ChangeEvent::TaskRolledOver { task_id, at: now });
        }
        self.retire_elapsed_sleep(now);
    }

    /// Once the day's sleep occurrence has ended, mark it complete so it
    /// cannot shadow real work until its midnight rollover resurrects it.
    fn retire_elapsed_sleep(&mut self, now: DateTime<Utc>) {
        if self.asleep.is_in_window(&now) {
            return;
        }
        let sleep_id = self.sleep_task_id.clone();
        if let Some(sleep) = self.tasks.iter_mut().find(|t| t.id() == sleep_id) {
            if !sleep.is_complete() && sleep.deadline().is_some_and(|d| d < now) {
                sleep.complete_next_step();
            }
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Deep capture of all task state plus the blackout windows.
    pub fn snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            tasks: self.tasks.clone(),
            asleep: self.asleep,
            downtime: self.downtime,
            sleep_task_id: self.sleep_task_id.clone(),
        }
    }

    /// Replace all state with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: CollectionSnapshot) {
        self.tasks = snapshot.tasks;
        self.asleep = snapshot.asleep;
        self.downtime = snapshot.downtime;
        self.sleep_task_id = snapshot.sleep_task_id;
        self.notify(ChangeEvent::Restored);
    }

    fn notify(&mut self, event: ChangeEvent) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_change(&event);
        }
    }
}

impl fmt::Debug for TaskCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCollection")
            .field("tasks", &self.tasks)
            .field("asleep", &self.asleep)
            .field("downtime", &self.downtime)
            .field("sleep_task_id", &self.sleep_task_id)
            .finish_non_exhaustive()
    }
}

/// Derive the sleep task's occurrence from the asleep window: project onto
/// `now`'s day, or the next day when today's occurrence is already over,
/// and repeat every 24 hours.
fn project_sleep_task(task: &mut Task, asleep: &TimeWindow, now: DateTime<Utc>) {
    let mut occurrence: DateRange = asleep.occurrence_on(now.date_naive());
    if occurrence.end <= now {
        occurrence = asleep.occurrence_on(now.date_naive() + Duration::days(1));
    }
    task.make_recurring(Duration::hours(24), occurrence.start)
        .expect("24 hours is a positive period");
    task.set_deadline(Some(occurrence.end));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::StepStatus;
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    struct Recorder(Rc<RefCell<Vec<ChangeEvent>>>);

    impl ChangeListener for Recorder {
        fn on_change(&mut self, event: &ChangeEvent) {
            self.0.borrow_mut().push(event.clone());
        }
    }

    #[test]
    fn construction_creates_the_sleep_task() {
        let now = at(2025, 3, 10, 14, 0);
        let collection = TaskCollection::new(now);
        let sleep = collection.task(collection.sleep_task_id()).unwrap();
        assert!(sleep.is_mandatory());
        assert!(sleep.is_recurring());
        assert_eq!(sleep.repeat_interval(), Some(Duration::hours(24)));
        // Constructed after 08:00, so the current occurrence is tomorrow's.
        assert_eq!(sleep.earliest_start(), Some(at(2025, 3, 11, 0, 0)));
        assert_eq!(sleep.deadline(), Some(at(2025, 3, 11, 8, 0)));
    }

    #[test]
    fn asleep_window_overrides_the_scheduler() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("urgent work");
        collection.edit_task(&id, |t| {
            t.set_deadline(Some(at(2025, 3, 10, 18, 0)));
        });

        let night = at(2025, 3, 11, 3, 0);
        let sleep_id = collection.sleep_task_id().to_string();
        assert_eq!(collection.priority_task(night).unwrap().id(), sleep_id);
    }

    #[test]
    fn daytime_delegates_to_the_scheduler() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("work");
        collection.edit_task(&id, |t| {
            t.set_deadline(Some(at(2025, 3, 10, 18, 0)));
        });
        assert_eq!(collection.priority_task(now).unwrap().id(), id);
    }

    #[test]
    fn sleep_task_refuses_removal() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let sleep_id = collection.sleep_task_id().to_string();
        assert!(!collection.remove_task(&sleep_id));
        assert!(collection.task(&sleep_id).is_some());
    }

    #[test]
    fn tick_rolls_over_recurring_tasks() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("daily review");
        collection.add_step(&id, "read inbox");
        collection
            .make_recurring(&id, Duration::days(1), at(2025, 3, 10, 9, 0))
            .unwrap();
        collection.complete_next_step(&id);
        assert!(collection.task(&id).unwrap().is_complete());

        let later = at(2025, 3, 12, 10, 0);
        collection.tick(later);
        let task = collection.task(&id).unwrap();
        assert!(!task.is_complete());
        assert_eq!(task.steps()[0].status(), StepStatus::Uncomplete);
        assert_eq!(task.earliest_start(), Some(at(2025, 3, 13, 9, 0)));
    }

    #[test]
    fn tick_is_idempotent_for_a_fixed_now() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("daily review");
        collection
            .make_recurring(&id, Duration::days(1), at(2025, 3, 10, 9, 0))
            .unwrap();

        let later = at(2025, 3, 14, 10, 0);
        collection.tick(later);
        let once = collection.snapshot();
        collection.tick(later);
        assert_eq!(collection.snapshot(), once);
    }

    #[test]
    fn snapshot_round_trip_is_observationally_identical() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("work");
        collection.add_step(&id, "draft");
        collection.add_step(&id, "review");
        collection.complete_next_step(&id);
        collection.edit_task(&id, |t| {
            t.set_deadline(Some(at(2025, 3, 10, 18, 0)));
        });

        let saved = collection.snapshot();

        // Diverge, then restore.
        collection.skip_next_step(&id);
        collection.remove_task(&id);
        collection.restore(saved.clone());

        assert_eq!(collection.snapshot(), saved);
        let task = collection.task(&id).unwrap();
        assert_eq!(task.next_step(), Some("review"));
        assert_eq!(collection.priority_task(now).unwrap().id(), id);
    }

    #[test]
    fn snapshot_survives_json() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let id = collection.add_task("work");
        collection.add_step(&id, "draft");

        let snapshot = collection.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: CollectionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);

        let rehydrated = TaskCollection::from_snapshot(decoded);
        assert_eq!(rehydrated.task(&id).unwrap().next_step(), Some("draft"));
    }

    #[test]
    fn mutators_notify_the_listener() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        collection.set_listener(Box::new(Recorder(Rc::clone(&events))));

        let id = collection.add_task("observed");
        collection.add_step(&id, "only step");
        collection.complete_next_step(&id);

        let seen = events.borrow();
        assert_eq!(
            *seen,
            vec![
                ChangeEvent::TaskAdded {
                    task_id: id.clone()
                },
                ChangeEvent::StepAdded {
                    task_id: id.clone(),
                    step: "only step".to_string()
                },
                ChangeEvent::StepCompleted {
                    task_id: id.clone(),
                    step: Some("only step".to_string())
                },
            ]
        );
    }

    #[test]
    fn prune_drops_only_completed_one_shots() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let done = collection.add_task("done");
        collection.complete_next_step(&done);
        let open = collection.add_task("open");
        let daily = collection.add_task("daily");
        collection
            .make_recurring(&daily, Duration::days(1), at(2025, 3, 10, 9, 0))
            .unwrap();
        collection.complete_next_step(&daily);

        assert_eq!(collection.prune_completed(), 1);
        assert!(collection.task(&done).is_none());
        assert!(collection.task(&open).is_some());
        assert!(collection.task(&daily).is_some());
    }

    #[test]
    fn set_asleep_window_reprojects_the_sleep_task() {
        let now = at(2025, 3, 10, 14, 0);
        let mut collection = TaskCollection::new(now);
        let night = TimeWindow::new(Time::from_hm(22, 0), Time::from_hm(6, 0));
        collection.set_asleep_window(night, now);

        let sleep = collection.task(collection.sleep_task_id()).unwrap();
        assert_eq!(sleep.earliest_start(), Some(at(2025, 3, 10, 22, 0)));
        assert_eq!(sleep.deadline(), Some(at(2025, 3, 11, 6, 0)));
    }
}
