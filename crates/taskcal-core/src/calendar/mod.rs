//! Remote calendar access.
//!
//! The core talks to the calendar only through [`CalendarClient`]. Two
//! implementations ship with the crate: [`GoogleCalendarClient`] (REST v3 over
//! blocking reqwest) and [`InMemoryCalendar`] (tests and offline previews).

pub mod google;
pub mod memory;

pub use google::GoogleCalendarClient;
pub use memory::InMemoryCalendar;

use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Color marker applied to managed events on creation.
pub const MANAGED_EVENT_COLOR: &str = "8";

/// Start or end of a remote event, kept in the provider's shape so it can be
/// sent back untouched on update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Local date-time in the given zone.
    pub fn at(instant: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: Some(instant.format("%Y-%m-%dT%H:%M:%S").to_string()),
            date: None,
            time_zone: Some(time_zone.to_string()),
        }
    }

    /// Human-readable form (date-time if present, else the all-day date).
    pub fn display(&self) -> &str {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or("?")
    }
}

/// An event owned by the remote calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub start: EventDateTime,
    #[serde(default)]
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl RemoteEvent {
    /// Whether this is the managed aggregate event for its day.
    pub fn is_managed(&self, event_name: &str) -> bool {
        self.summary.as_deref() == Some(event_name)
    }

    /// Number of list entries (`- ` lines) in the description.
    pub fn task_item_count(&self) -> usize {
        self.description
            .as_deref()
            .map(|d| d.lines().filter(|l| l.trim_start().starts_with("- ")).count())
            .unwrap_or(0)
    }
}

/// Body of an event creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub summary: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub color_id: String,
}

/// Full replacement body of an event update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl EventUpdate {
    /// Replace the description of `event`, keeping everything else.
    pub fn with_description(event: &RemoteEvent, description: String) -> Self {
        Self {
            summary: event.summary.clone(),
            description,
            start: event.start.clone(),
            end: event.end.clone(),
            color_id: event.color_id.clone(),
        }
    }
}

/// Blocking access to a single remote calendar.
///
/// Instants are local date-times interpreted in the calendar's configured
/// time zone. `list_events` returns single (recurrence-expanded) events
/// ordered by start time.
pub trait CalendarClient {
    fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RemoteEvent>, CalendarError>;

    fn create_event(&self, event: &NewEvent) -> Result<RemoteEvent, CalendarError>;

    fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<RemoteEvent, CalendarError>;

    fn delete_event(&self, event_id: &str) -> Result<(), CalendarError>;
}

/// `[date 00:00, date+1 00:00)`
pub fn day_window(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    (start, start + Days::new(1))
}

/// Read events, substituting an empty list on any failure.
///
/// Callers proceed as if the range were empty, which can lead to
/// over-scheduling or a duplicate managed event when the read fails.
pub fn events_between<C: CalendarClient + ?Sized>(
    client: &C,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<RemoteEvent> {
    match client.list_events(start, end) {
        Ok(events) => events,
        Err(err) => {
            tracing::warn!(%start, %end, error = %err, "failed to fetch events; treating range as empty");
            Vec::new()
        }
    }
}

/// All events on one calendar day (see [`events_between`]).
pub fn events_on<C: CalendarClient + ?Sized>(client: &C, date: NaiveDate) -> Vec<RemoteEvent> {
    let (start, end) = day_window(date);
    events_between(client, start, end)
}
