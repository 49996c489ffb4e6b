//! Task prioritization.
//!
//! The scheduler is a pure function over a slice of tasks and the caller's
//! clock: it filters out tasks that cannot or should not be worked right
//! now, then sorts the rest through an ordered tie-break chain. The first
//! decisive comparator wins:
//!
//! 1. During weekly downtime, mandatory tasks yield to optional ones
//!    unless the mandatory task is urgent.
//! 2. A mandatory task at real risk of missing its deadline (its minimum
//!    slack is below the optional task's maximum effort) goes first.
//! 3. Less time to complete.
//! 4. Less minimum slack.
//! 5. Less maximum slack.
//! 6. More progress (prefer finishing started work).

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::TimeWindow;
use crate::range::RecurringDateRange;
use crate::task::Task;

/// Scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How close a deadline must be for a task to count as urgent (ms).
    pub urgency_threshold_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            urgency_threshold_ms: Duration::hours(24).num_milliseconds(),
        }
    }
}

/// Everything the prioritizer reads besides the tasks themselves.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerContext<'a> {
    pub now: DateTime<Utc>,
    /// Daily blackout window; subtracted from every time-to-complete.
    pub asleep: &'a TimeWindow,
    /// Weekly off-hours window; flips the mandatory/optional preference.
    pub downtime: &'a RecurringDateRange,
}

/// Multi-criteria task prioritizer.
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler with default config.
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    /// Create with custom config.
    pub fn with_config(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether the task's deadline is within the urgency threshold of
    /// `now` (or already past). Deadline-less tasks are never urgent.
    pub fn is_urgent(&self, task: &Task, now: DateTime<Utc>) -> bool {
        match task.deadline() {
            Some(deadline) => {
                deadline - now <= Duration::milliseconds(self.config.urgency_threshold_ms)
            }
            None => false,
        }
    }

    /// The single most important task, or `None` when nothing qualifies.
    pub fn most_important_task<'t>(
        &self,
        tasks: &'t [Task],
        ctx: &SchedulerContext<'_>,
    ) -> Option<&'t Task> {
        self.rank(tasks, ctx).into_iter().next()
    }

    /// All workable tasks, most important first.
    pub fn rank<'t>(&self, tasks: &'t [Task], ctx: &SchedulerContext<'_>) -> Vec<&'t Task> {
        let mut ranked: Vec<&Task> = tasks
            .iter()
            .filter(|t| self.is_candidate(t, ctx.now))
            .collect();
        ranked.sort_by(|a, b| self.compare(a, b, ctx));
        ranked
    }

    fn is_candidate(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if let Some(start) = task.earliest_start() {
            if start > now {
                return false;
            }
        }
        if task.is_complete() {
            return false;
        }
        // Skipped optional tasks hide from the queue until they become
        // urgent again.
        if task.is_skipped() && !task.is_mandatory() && !self.is_urgent(task, now) {
            return false;
        }
        true
    }

    /// The ordered tie-break chain. `Less` means `a` goes first.
    fn compare(&self, a: &Task, b: &Task, ctx: &SchedulerContext<'_>) -> Ordering {
        let now = ctx.now;

        // Off-hours flip: during downtime a non-urgent mandatory task
        // yields to an optional one.
        if ctx.downtime.contains(&now) {
            match (a.is_mandatory(), b.is_mandatory()) {
                (true, false) if !self.is_urgent(a, now) => return Ordering::Greater,
                (false, true) if !self.is_urgent(b, now) => return Ordering::Less,
                _ => {}
            }
        }

        // A mandatory task whose worst-case slack no longer covers the
        // optional task's worst-case effort is at real risk; it goes first.
        match (a.is_mandatory(), b.is_mandatory()) {
            (true, false) if self.at_risk_against(a, b, ctx) => return Ordering::Less,
            (false, true) if self.at_risk_against(b, a, ctx) => return Ordering::Greater,
            _ => {}
        }

        cmp_bounded(
            a.time_to_complete(now, ctx.asleep),
            b.time_to_complete(now, ctx.asleep),
        )
        .then_with(|| {
            cmp_bounded(
                a.min_slack_time(now, ctx.asleep),
                b.min_slack_time(now, ctx.asleep),
            )
        })
        .then_with(|| {
            cmp_bounded(
                a.max_slack_time(now, ctx.asleep),
                b.max_slack_time(now, ctx.asleep),
            )
        })
        .then_with(|| {
            b.progress()
                .partial_cmp(&a.progress())
                .unwrap_or(Ordering::Equal)
        })
    }

    fn at_risk_against(&self, mandatory: &Task, optional: &Task, ctx: &SchedulerContext<'_>) -> bool {
        match mandatory.min_slack_time(ctx.now, ctx.asleep) {
            Some(slack) => slack < optional.max_required_time(),
            None => false,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Order two possibly-unbounded durations; `None` (no deadline) sorts last.
fn cmp_bounded(a: Option<Duration>, b: Option<Duration>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Time;
    use crate::range::DateRange;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn asleep() -> TimeWindow {
        TimeWindow::new(Time::MIDNIGHT, Time::from_hm(8, 0))
    }

    /// A downtime window that never matches the probe times used below.
    fn idle_downtime() -> RecurringDateRange {
        let start = at(2000, 1, 1, 0, 0);
        RecurringDateRange::new(
            DateRange::new(start, start + Duration::hours(1)),
            Duration::days(3650),
        )
        .unwrap()
    }

    fn ctx<'a>(
        now: DateTime<Utc>,
        asleep: &'a TimeWindow,
        downtime: &'a RecurringDateRange,
    ) -> SchedulerContext<'a> {
        SchedulerContext {
            now,
            asleep,
            downtime,
        }
    }

    #[test]
    fn filters_unstartable_complete_and_skipped_optional() {
        let now = at(2025, 3, 10, 12, 0);
        let mut future = Task::new("future");
        future.set_earliest_start(Some(now + Duration::hours(2)));

        let mut done = Task::new("done");
        done.complete_next_step();

        let mut declined = Task::new("declined");
        declined.set_deadline(Some(now + Duration::days(10)));
        declined.skip_next_step();

        let mut workable = Task::new("workable");
        workable.set_deadline(Some(now + Duration::days(5)));

        let tasks = vec![future, done, declined, workable];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let ranked = scheduler.rank(&tasks, &ctx(now, &window, &downtime));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].description(), "workable");
    }

    #[test]
    fn skipped_optional_task_returns_when_urgent() {
        let now = at(2025, 3, 10, 12, 0);
        let mut declined = Task::new("declined");
        declined.set_deadline(Some(now + Duration::hours(3)));
        declined.skip_next_step();

        let tasks = vec![declined];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let ranked = scheduler.rank(&tasks, &ctx(now, &window, &downtime));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn skipped_mandatory_task_stays_in_queue() {
        let now = at(2025, 3, 10, 12, 0);
        let mut must = Task::new("must");
        must.set_mandatory(true);
        must.set_deadline(Some(now + Duration::days(10)));
        must.skip_next_step();

        let tasks = vec![must];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        assert_eq!(
            scheduler.rank(&tasks, &ctx(now, &window, &downtime)).len(),
            1
        );
    }

    #[test]
    fn closer_deadline_wins() {
        let now = at(2025, 3, 10, 12, 0);
        let mut soon = Task::new("soon");
        soon.set_deadline(Some(now + Duration::hours(30)));
        let mut later = Task::new("later");
        later.set_deadline(Some(now + Duration::hours(60)));

        let tasks = vec![later, soon];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "soon");
    }

    #[test]
    fn bounded_deadline_beats_unbounded() {
        let now = at(2025, 3, 10, 12, 0);
        let open = Task::new("open");
        let mut due = Task::new("due");
        due.set_deadline(Some(now + Duration::days(30)));

        let tasks = vec![open, due];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "due");
    }

    #[test]
    fn mandatory_at_risk_beats_optional_regardless_of_other_criteria() {
        let now = at(2025, 3, 10, 12, 0);
        // Optional task: closer deadline, would win on time-to-complete.
        let mut optional = Task::new("optional");
        optional.set_deadline(Some(now + Duration::hours(10)));
        optional.set_min_required_time(Some(Duration::hours(1)));
        optional.set_max_required_time(Some(Duration::hours(2)));

        // Mandatory task: farther deadline but nearly no slack left.
        let mut mandatory = Task::new("mandatory");
        mandatory.set_mandatory(true);
        mandatory.set_deadline(Some(now + Duration::hours(20)));
        mandatory.set_max_required_time(Some(Duration::hours(19)));

        let tasks = vec![optional, mandatory];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "mandatory");
    }

    #[test]
    fn min_slack_breaks_time_to_complete_ties() {
        let now = at(2025, 3, 10, 12, 0);
        let deadline = now + Duration::hours(10);
        let mut heavy = Task::new("heavy");
        heavy.set_deadline(Some(deadline));
        heavy.set_max_required_time(Some(Duration::hours(8)));
        let mut light = Task::new("light");
        light.set_deadline(Some(deadline));
        light.set_max_required_time(Some(Duration::hours(1)));

        let tasks = vec![light, heavy];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "heavy");
    }

    #[test]
    fn progress_breaks_full_ties() {
        let now = at(2025, 3, 10, 12, 0);
        let deadline = now + Duration::hours(10);
        let mut fresh = Task::new("fresh");
        fresh.set_deadline(Some(deadline));
        fresh.add_step("a");
        fresh.add_step("b");
        let mut started = Task::new("started");
        started.set_deadline(Some(deadline));
        started.add_step("a");
        started.add_step("b");
        started.complete_next_step();

        let tasks = vec![fresh, started];
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "started");
    }

    #[test]
    fn downtime_flips_mandatory_below_optional() {
        let now = at(2025, 3, 15, 12, 0); // Saturday
        let downtime = RecurringDateRange::weekend_of(now);
        assert!(downtime.contains(&now));

        let mut chore = Task::new("chore");
        chore.set_mandatory(true);
        chore.set_deadline(Some(now + Duration::days(10)));
        let mut hobby = Task::new("hobby");
        hobby.set_deadline(Some(now + Duration::days(20)));

        let tasks = vec![chore, hobby];
        let window = asleep();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "hobby");
    }

    #[test]
    fn urgent_mandatory_keeps_priority_during_downtime() {
        let now = at(2025, 3, 15, 12, 0); // Saturday
        let downtime = RecurringDateRange::weekend_of(now);

        let mut urgent = Task::new("urgent chore");
        urgent.set_mandatory(true);
        urgent.set_deadline(Some(now + Duration::hours(6)));
        let mut hobby = Task::new("hobby");
        hobby.set_deadline(Some(now + Duration::days(20)));

        let tasks = vec![hobby, urgent];
        let window = asleep();
        let scheduler = Scheduler::new();
        let best = scheduler
            .most_important_task(&tasks, &ctx(now, &window, &downtime))
            .unwrap();
        assert_eq!(best.description(), "urgent chore");
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let now = at(2025, 3, 10, 12, 0);
        let window = asleep();
        let downtime = idle_downtime();
        let scheduler = Scheduler::new();
        assert!(scheduler
            .most_important_task(&[], &ctx(now, &window, &downtime))
            .is_none());
    }
}
