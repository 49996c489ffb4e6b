//! The task entity and its step state machine.
//!
//! A task carries an ordered list of steps, timing attributes, and optional
//! recurrence. Like the rest of the engine it owns no clock: every
//! time-dependent operation takes `now` from the caller.
//!
//! Step texts act as unique keys within a task; inserting a duplicate
//! collapses into the existing step. Which step is "next" is biased by the
//! last action taken: immediately after a skip, skipped steps are not
//! re-offered, so the user is not re-presented with a step they just
//! declined. Once something else has been completed, skipped steps
//! recirculate.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::TimeWindow;
use crate::error::ValidationError;
use crate::range::DateRange;

/// Unique identifier for a task.
pub type TaskId = String;

/// Status of a single step within a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    /// Step has been done.
    Completed,
    /// Step was declined; it recirculates later.
    Skipped,
    /// Step has not been actioned yet (initial state).
    Uncomplete,
}

/// The last status a task applied to one of its steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepAction {
    Completed,
    Skipped,
}

/// One sub-unit of a task's work, identified by its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    text: String,
    status: StepStatus,
}

impl Step {
    fn new(text: String) -> Self {
        Step {
            text,
            status: StepStatus::Uncomplete,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }
}

/// A schedulable unit of work.
///
/// Fields are private; all mutation goes through methods so the recurrence
/// invariant (`deadline - earliest_start <= repeat_interval`) survives any
/// edit. Millisecond quantities are stored as integers so snapshots
/// round-trip through JSON unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    description: String,
    steps: Vec<Step>,
    last_action: Option<StepAction>,
    earliest_start: Option<DateTime<Utc>>,
    deadline: Option<DateTime<Utc>>,
    min_required_ms: Option<i64>,
    max_required_ms: Option<i64>,
    repeat_interval_ms: Option<i64>,
    mandatory: bool,
    complete: bool,
    skipped: bool,
}

impl Task {
    /// Create a new task with no steps and no timing attributes.
    pub fn new(description: impl Into<String>) -> Self {
        Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            description: description.into(),
            steps: Vec::new(),
            last_action: None,
            earliest_start: None,
            deadline: None,
            min_required_ms: None,
            max_required_ms: None,
            repeat_interval_ms: None,
            mandatory: false,
            complete: false,
            skipped: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last_action(&self) -> Option<StepAction> {
        self.last_action
    }

    pub fn earliest_start(&self) -> Option<DateTime<Utc>> {
        self.earliest_start
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn repeat_interval(&self) -> Option<Duration> {
        self.repeat_interval_ms.map(Duration::milliseconds)
    }

    pub fn is_recurring(&self) -> bool {
        self.repeat_interval_ms.is_some()
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// The step to work on next, under the skip-biased policy.
    ///
    /// Immediately after a skip only `UNCOMPLETE` steps qualify; otherwise
    /// the first non-`COMPLETED` step is offered, which lets previously
    /// skipped steps recirculate.
    pub fn next_step(&self) -> Option<&str> {
        self.next_step_index().map(|i| self.steps[i].text.as_str())
    }

    fn next_step_index(&self) -> Option<usize> {
        match self.last_action {
            Some(StepAction::Skipped) => self
                .steps
                .iter()
                .position(|s| s.status == StepStatus::Uncomplete),
            _ => self
                .steps
                .iter()
                .position(|s| s.status != StepStatus::Completed),
        }
    }

    /// Completion fraction: 1 when complete, completed/total otherwise,
    /// 0 for a task with no steps.
    pub fn progress(&self) -> f64 {
        if self.complete {
            return 1.0;
        }
        if self.steps.is_empty() {
            return 0.0;
        }
        let done = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        done as f64 / self.steps.len() as f64
    }

    // ── Step commands ────────────────────────────────────────────────

    /// Append a step in `UNCOMPLETE` state. Duplicate texts collapse into
    /// the existing step (step text is the unique key).
    pub fn add_step(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.steps.iter().any(|s| s.text == text) {
            return;
        }
        self.steps.push(Step::new(text));
    }

    /// Complete the next step; with no steps, complete the task directly.
    /// Marks the task complete once every step is `COMPLETED`.
    pub fn complete_next_step(&mut self) {
        if self.steps.is_empty() {
            self.complete = true;
            self.last_action = Some(StepAction::Completed);
            return;
        }
        if let Some(index) = self.next_step_index() {
            self.steps[index].status = StepStatus::Completed;
        }
        self.last_action = Some(StepAction::Completed);
        if self
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed)
        {
            self.complete = true;
        }
    }

    /// Skip the next step; with no steps, skip the task directly. Marks the
    /// task skipped once no step is left `UNCOMPLETE`.
    pub fn skip_next_step(&mut self) {
        if self.steps.is_empty() {
            self.skipped = true;
            self.last_action = Some(StepAction::Skipped);
            return;
        }
        if let Some(index) = self.next_step_index() {
            self.steps[index].status = StepStatus::Skipped;
        }
        self.last_action = Some(StepAction::Skipped);
        if self
            .steps
            .iter()
            .all(|s| s.status != StepStatus::Uncomplete)
        {
            self.skipped = true;
        }
    }

    /// Rename the current next step in place, preserving its status and the
    /// order of everything after it. No-op when there is no next step.
    pub fn replace_next_step(&mut self, new_text: impl Into<String>) {
        if let Some(index) = self.next_step_index() {
            self.steps[index].text = new_text.into();
        }
    }

    /// Rebuild the step list from `new_steps`, re-attaching the existing
    /// statuses positionally: the i-th old status goes to the i-th new step,
    /// extra new steps start `UNCOMPLETE`. This is an index mapping, not a
    /// text match; reordering texts moves statuses with the positions.
    pub fn edit_steps<S: AsRef<str>>(&mut self, new_steps: &[S]) {
        let mut rebuilt: Vec<Step> = Vec::with_capacity(new_steps.len());
        for (i, text) in new_steps.iter().enumerate() {
            let text = text.as_ref();
            if rebuilt.iter().any(|s| s.text == text) {
                continue;
            }
            let status = self
                .steps
                .get(i)
                .map(|s| s.status)
                .unwrap_or(StepStatus::Uncomplete);
            rebuilt.push(Step {
                text: text.to_string(),
                status,
            });
        }
        self.steps = rebuilt;
    }

    // ── Timing attributes ────────────────────────────────────────────

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_mandatory(&mut self, mandatory: bool) {
        self.mandatory = mandatory;
    }

    pub fn set_earliest_start(&mut self, earliest_start: Option<DateTime<Utc>>) {
        self.earliest_start = earliest_start;
        self.clamp_deadline();
    }

    pub fn set_deadline(&mut self, deadline: Option<DateTime<Utc>>) {
        self.deadline = deadline;
        self.clamp_deadline();
    }

    pub fn set_min_required_time(&mut self, min: Option<Duration>) {
        self.min_required_ms = min.map(|d| d.num_milliseconds());
    }

    pub fn set_max_required_time(&mut self, max: Option<Duration>) {
        self.max_required_ms = max.map(|d| d.num_milliseconds());
    }

    /// Make the task recurring with the given period, starting its current
    /// occurrence at `interval_start`. The deadline is clamped to
    /// `interval_start + period` when unset or currently later.
    pub fn make_recurring(
        &mut self,
        period: Duration,
        interval_start: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let millis = period.num_milliseconds();
        if millis <= 0 {
            return Err(ValidationError::NonPositivePeriod { millis });
        }
        self.repeat_interval_ms = Some(millis);
        self.earliest_start = Some(interval_start);
        self.clamp_deadline();
        Ok(())
    }

    /// Keep `deadline - earliest_start <= repeat_interval` after any edit.
    fn clamp_deadline(&mut self) {
        let (Some(start), Some(interval_ms)) = (self.earliest_start, self.repeat_interval_ms)
        else {
            return;
        };
        let cap = start + Duration::milliseconds(interval_ms);
        match self.deadline {
            Some(deadline) if deadline <= cap => {}
            _ => self.deadline = Some(cap),
        }
    }

    // ── Recurrence rollover ──────────────────────────────────────────

    /// Whether the current occurrence's whole interval has elapsed.
    pub fn is_past_interval_end(&self, now: DateTime<Utc>) -> bool {
        match (self.earliest_start, self.repeat_interval_ms) {
            (Some(start), Some(interval_ms)) => {
                now > start + Duration::milliseconds(interval_ms)
            }
            _ => false,
        }
    }

    /// Roll over into the next occurrence: reset every step to
    /// `UNCOMPLETE`, clear the completion flags and the last action, then
    /// advance `earliest_start` (and the deadline, if set) by whole
    /// multiples of the repeat interval until the next occurrence start is
    /// in the future relative to `now`.
    ///
    /// The advance is a single integer division, not a loop; the elapsed
    /// gap may span astronomically many periods.
    pub fn on_past_interval_end(&mut self, now: DateTime<Utc>) {
        for step in &mut self.steps {
            step.status = StepStatus::Uncomplete;
        }
        self.complete = false;
        self.skipped = false;
        self.last_action = None;

        let (Some(start), Some(interval_ms)) = (self.earliest_start, self.repeat_interval_ms)
        else {
            return;
        };
        let elapsed_ms = (now - start).num_milliseconds();
        if elapsed_ms < 0 {
            return;
        }
        // Smallest whole number of periods that puts the start past `now`.
        let periods = elapsed_ms.div_euclid(interval_ms) + 1;
        let shift = Duration::milliseconds(periods * interval_ms);
        self.earliest_start = Some(start + shift);
        if let Some(deadline) = self.deadline {
            self.deadline = Some(deadline + shift);
        }
    }

    // ── Effort and slack ─────────────────────────────────────────────

    /// Lower effort bound; zero when unset.
    pub fn min_required_time(&self) -> Duration {
        Duration::milliseconds(self.min_required_ms.unwrap_or(0))
    }

    /// Upper effort bound; falls back to the lower bound, then zero.
    pub fn max_required_time(&self) -> Duration {
        Duration::milliseconds(self.max_required_ms.or(self.min_required_ms).unwrap_or(0))
    }

    /// Working time left before the deadline, with the daily blackout
    /// window subtracted day by day. `None` means no deadline (unbounded).
    ///
    /// The measured span is `[max(now, earliest_start), deadline]`.
    pub fn time_to_complete(&self, now: DateTime<Utc>, asleep: &TimeWindow) -> Option<Duration> {
        let deadline = self.deadline?;
        let from = match self.earliest_start {
            Some(start) if start > now => start,
            _ => now,
        };
        Some(DateRange::new(from, deadline).duration_without_window(asleep))
    }

    /// Spare time assuming the task takes its maximum effort.
    pub fn min_slack_time(&self, now: DateTime<Utc>, asleep: &TimeWindow) -> Option<Duration> {
        self.time_to_complete(now, asleep)
            .map(|t| t - self.max_required_time())
    }

    /// Spare time assuming the task takes its minimum effort.
    pub fn max_slack_time(&self, now: DateTime<Utc>, asleep: &TimeWindow) -> Option<Duration> {
        self.time_to_complete(now, asleep)
            .map(|t| t - self.min_required_time())
    }
}
