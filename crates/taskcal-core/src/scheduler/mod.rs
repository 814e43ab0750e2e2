//! Recurring task scheduler.
//!
//! Places every configured task on concrete dates:
//! - Walks each task's intervals in order, advancing by the interval minimum
//! - Skips avoided weekdays, avoided dates and days already holding the
//!   task's category
//! - Respects the per-day limit, counting both remote task items and tasks
//!   already placed in this run
//! - Stops a task for good once it reaches the event horizon
//!
//! Placements later than the interval maximum produce a [`DelayWarning`];
//! they never block scheduling.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::calendar::{events_on, CalendarClient};
use crate::config::{Config, Interval, TaskDefinition};

/// A task bound to a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub name: String,
    pub category: String,
}

/// Date → tasks, in first-placement order; tasks within a day in
/// configuration order.
pub type Schedule = IndexMap<NaiveDate, Vec<ScheduledTask>>;

/// A placement that landed later than its interval allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayWarning {
    pub task_name: String,
    /// Days beyond the interval minimum.
    pub delay_days: i64,
    /// Configured `(min, max)` range.
    pub allowed: (u32, u32),
    pub date: NaiveDate,
}

/// Result of one scheduling run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOutcome {
    pub schedule: Schedule,
    pub warnings: Vec<DelayWarning>,
}

impl ScheduleOutcome {
    /// Total number of placements.
    pub fn task_count(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }
}

/// Computes a schedule for one configuration.
pub struct Scheduler<'a, C: CalendarClient + ?Sized> {
    config: &'a Config,
    client: &'a C,
    today: NaiveDate,
    horizon: NaiveDateTime,
}

impl<'a, C: CalendarClient + ?Sized> Scheduler<'a, C> {
    /// Create a scheduler running at `now` (local time); the horizon is
    /// fixed here.
    pub fn new(config: &'a Config, client: &'a C, now: NaiveDateTime) -> Self {
        Self {
            config,
            client,
            today: now.date(),
            horizon: now
                .checked_add_days(Days::new(u64::from(config.horizon_days)))
                .unwrap_or(NaiveDateTime::MAX),
        }
    }

    pub fn horizon(&self) -> NaiveDateTime {
        self.horizon
    }

    /// Place every task, in configuration order.
    pub fn compute_schedule(&self) -> ScheduleOutcome {
        let mut outcome = ScheduleOutcome::default();
        for task in &self.config.tasks {
            self.schedule_task(task, &mut outcome);
        }
        tracing::info!(
            days = outcome.schedule.len(),
            tasks = outcome.task_count(),
            warnings = outcome.warnings.len(),
            "computed schedule"
        );
        outcome
    }

    fn schedule_task(&self, task: &TaskDefinition, outcome: &mut ScheduleOutcome) {
        let mut running = task.start_date.resolve(self.today);

        for interval in &task.intervals {
            for _ in 0..interval.repetitions {
                let Some(date) = self.place(task, interval, running, &mut outcome.schedule)
                else {
                    tracing::debug!(task = %task.name, horizon = %self.horizon, "reached event horizon");
                    return;
                };

                let delay = (date - running).num_days() - i64::from(interval.min_days());
                if delay > i64::from(interval.max_days()) - i64::from(interval.min_days()) {
                    let warning = DelayWarning {
                        task_name: task.name.clone(),
                        delay_days: delay,
                        allowed: interval.range,
                        date,
                    };
                    tracing::warn!(
                        task = %warning.task_name,
                        delay_days = warning.delay_days,
                        min = interval.min_days(),
                        max = interval.max_days(),
                        %date,
                        "task delayed beyond its allowed range"
                    );
                    outcome.warnings.push(warning);
                }

                running = date;
            }
        }
    }

    /// Find and record the date for one repetition, or `None` at the horizon.
    /// Running off the end of the calendar counts as reaching it.
    fn place(
        &self,
        task: &TaskDefinition,
        interval: &Interval,
        from: NaiveDate,
        schedule: &mut Schedule,
    ) -> Option<NaiveDate> {
        let mut candidate = from.checked_add_days(Days::new(u64::from(interval.min_days())))?;
        loop {
            if self.at_horizon(candidate) {
                return None;
            }
            if self.can_schedule(task, candidate, schedule) {
                break;
            }
            candidate = candidate.checked_add_days(Days::new(1))?;
        }

        schedule.entry(candidate).or_default().push(ScheduledTask {
            name: task.name.clone(),
            category: task.category.clone(),
        });
        Some(candidate)
    }

    fn at_horizon(&self, date: NaiveDate) -> bool {
        date.and_time(NaiveTime::MIN) >= self.horizon
    }

    fn can_schedule(&self, task: &TaskDefinition, date: NaiveDate, schedule: &Schedule) -> bool {
        let weekday = date.weekday().num_days_from_monday() as u8;
        if task.avoid_days.weekdays.contains(&weekday) {
            return false;
        }
        if task.avoid_days.dates.contains(&date) {
            return false;
        }

        let placed = schedule.get(&date).map(Vec::as_slice).unwrap_or_default();
        if self.config.exclusive_categories && placed.iter().any(|t| t.category == task.category) {
            return false;
        }

        if let Some(max) = self.config.max_tasks_per_day {
            if placed.len() >= max {
                return false;
            }
            if self.remote_task_items(date) + placed.len() >= max {
                return false;
            }
        }

        true
    }

    /// Task items already on the remote calendar for `date`.
    fn remote_task_items(&self, date: NaiveDate) -> usize {
        events_on(self.client, date)
            .iter()
            .filter(|e| {
                e.summary
                    .as_deref()
                    .is_some_and(|s| s.contains(&self.config.task_phrase))
            })
            .map(|e| e.task_item_count())
            .sum()
    }
}
