//! Bulk removal of calendar events by summary pattern.

use chrono::{Days, NaiveDate, NaiveTime};

use crate::calendar::{events_between, CalendarClient, RemoteEvent};
use crate::error::CalendarError;

/// Summary shown for events that have none.
pub const UNTITLED: &str = "(untitled)";

/// Summary of `event`, or [`UNTITLED`].
pub fn display_summary(event: &RemoteEvent) -> &str {
    event.summary.as_deref().unwrap_or(UNTITLED)
}

/// Events between `from` 00:00 and the end of `to` whose summary contains
/// `pattern`. Untitled events match against [`UNTITLED`].
pub fn find_matching_events<C: CalendarClient + ?Sized>(
    client: &C,
    pattern: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<RemoteEvent> {
    let start = from.and_time(NaiveTime::MIN);
    let end = (to + Days::new(1)).and_time(NaiveTime::MIN);
    let matching: Vec<RemoteEvent> = events_between(client, start, end)
        .into_iter()
        .filter(|e| display_summary(e).contains(pattern))
        .collect();
    tracing::debug!(pattern, %from, %to, matched = matching.len(), "matched events");
    matching
}

/// Delete every event in order.
///
/// # Errors
///
/// Stops at the first failed deletion; earlier ones stay deleted.
pub fn delete_events<C: CalendarClient + ?Sized>(
    client: &C,
    events: &[RemoteEvent],
) -> Result<usize, CalendarError> {
    for event in events {
        client.delete_event(&event.id)?;
        tracing::info!(event_id = %event.id, summary = display_summary(event), "deleted event");
    }
    Ok(events.len())
}
