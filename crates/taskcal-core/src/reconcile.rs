//! Reconciliation of a schedule into managed calendar events.
//!
//! Each scheduled day maps onto exactly one managed event, the one whose
//! summary equals `event_name`. New tasks are appended to its description as
//! `- <name>` lines, or a fresh event is created when the day has none.

use chrono::NaiveDate;

use crate::calendar::{
    events_on, CalendarClient, EventDateTime, EventUpdate, NewEvent, RemoteEvent,
    MANAGED_EVENT_COLOR,
};
use crate::config::Config;
use crate::error::CalendarError;
use crate::history::HistoryRecord;
use crate::scheduler::{Schedule, ScheduledTask};

/// Description block for a list of tasks.
pub fn build_description<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| format!("- {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Existing description with `addition` appended on a new line.
pub fn append_description(existing: Option<&str>, addition: &str) -> String {
    let existing = existing.unwrap_or_default().trim();
    format!("{existing}\n{addition}").trim().to_string()
}

/// First managed event among `events`.
pub fn find_managed<'e>(events: &'e [RemoteEvent], event_name: &str) -> Option<&'e RemoteEvent> {
    events.iter().find(|e| e.is_managed(event_name))
}

/// Writes schedules to the remote calendar.
pub struct Reconciler<'a, C: CalendarClient + ?Sized> {
    config: &'a Config,
    client: &'a C,
}

impl<'a, C: CalendarClient + ?Sized> Reconciler<'a, C> {
    pub fn new(config: &'a Config, client: &'a C) -> Self {
        Self { config, client }
    }

    /// Merge every scheduled day into its managed event.
    ///
    /// Returns one record per day, in schedule order.
    ///
    /// # Errors
    ///
    /// The first failed remote write aborts the pass; days already written
    /// stay written.
    pub fn apply(&self, schedule: &Schedule) -> Result<Vec<HistoryRecord>, CalendarError> {
        let mut records = Vec::with_capacity(schedule.len());
        for (date, tasks) in schedule {
            records.push(self.apply_day(*date, tasks)?);
        }
        tracing::info!(days = records.len(), "reconciled schedule with calendar");
        Ok(records)
    }

    fn apply_day(
        &self,
        date: NaiveDate,
        tasks: &[ScheduledTask],
    ) -> Result<HistoryRecord, CalendarError> {
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
        let description = build_description(names.iter().map(String::as_str));

        let events = events_on(self.client, date);
        let updated_existing_event = match find_managed(&events, &self.config.event_name) {
            Some(existing) => {
                let merged = append_description(existing.description.as_deref(), &description);
                self.client
                    .update_event(&existing.id, &EventUpdate::with_description(existing, merged))?;
                tracing::info!(%date, event_id = %existing.id, tasks = names.len(), "appended tasks to managed event");
                true
            }
            None => {
                let tz = self.config.time_zone.name();
                let created = self.client.create_event(&NewEvent {
                    summary: self.config.event_name.clone(),
                    description,
                    start: EventDateTime::at(self.config.event_start(date), tz),
                    end: EventDateTime::at(self.config.event_end(date), tz),
                    color_id: MANAGED_EVENT_COLOR.to_string(),
                })?;
                tracing::info!(%date, event_id = %created.id, tasks = names.len(), "created managed event");
                false
            }
        };

        Ok(HistoryRecord {
            date,
            tasks: names,
            updated_existing_event,
        })
    }
}
