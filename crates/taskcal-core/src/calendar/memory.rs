//! In-process calendar.
//!
//! Behaves like a single remote calendar: events are filtered by overlap
//! with the requested window and returned ordered by start time. Used by the
//! test suites and by offline schedule previews.

use std::cell::{Cell, RefCell};

use chrono::{NaiveDate, NaiveDateTime};

use super::{CalendarClient, EventDateTime, EventUpdate, NewEvent, RemoteEvent};
use crate::error::CalendarError;

#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: RefCell<Vec<RemoteEvent>>,
    next_id: Cell<u64>,
    fail_reads: Cell<bool>,
    reads: Cell<usize>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an event as if it already existed remotely.
    pub fn insert(&self, event: RemoteEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Make every `list_events` call fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Snapshot of all stored events, ordered by start.
    pub fn events(&self) -> Vec<RemoteEvent> {
        let mut events = self.events.borrow().clone();
        events.sort_by_key(|e| parse_instant(&e.start));
        events
    }

    pub fn get(&self, event_id: &str) -> Option<RemoteEvent> {
        self.events.borrow().iter().find(|e| e.id == event_id).cloned()
    }

    /// Number of `list_events` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    fn allocate_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("mem-{id}")
    }
}

impl CalendarClient for InMemoryCalendar {
    fn list_events(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<RemoteEvent>, CalendarError> {
        self.reads.set(self.reads.get() + 1);
        if self.fail_reads.get() {
            return Err(CalendarError::Network("simulated read failure".into()));
        }

        Ok(self
            .events()
            .into_iter()
            .filter(|event| {
                let Some(ev_start) = parse_instant(&event.start) else {
                    return false;
                };
                let ev_end = parse_instant(&event.end).unwrap_or(ev_start);
                ev_start < end && (ev_end > start || ev_start >= start)
            })
            .collect())
    }

    fn create_event(&self, event: &NewEvent) -> Result<RemoteEvent, CalendarError> {
        let created = RemoteEvent {
            id: self.allocate_id(),
            summary: Some(event.summary.clone()),
            description: Some(event.description.clone()),
            start: event.start.clone(),
            end: event.end.clone(),
            color_id: Some(event.color_id.clone()),
        };
        self.events.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn update_event(
        &self,
        event_id: &str,
        update: &EventUpdate,
    ) -> Result<RemoteEvent, CalendarError> {
        let mut events = self.events.borrow_mut();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| CalendarError::NotFound(event_id.to_string()))?;

        event.summary = update.summary.clone();
        event.description = Some(update.description.clone());
        event.start = update.start.clone();
        event.end = update.end.clone();
        event.color_id = update.color_id.clone();
        Ok(event.clone())
    }

    fn delete_event(&self, event_id: &str) -> Result<(), CalendarError> {
        let mut events = self.events.borrow_mut();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return Err(CalendarError::NotFound(event_id.to_string()));
        }
        Ok(())
    }
}

fn parse_instant(at: &EventDateTime) -> Option<NaiveDateTime> {
    if let Some(date_time) = at.date_time.as_deref() {
        let local = date_time.get(..19)?;
        return NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M:%S").ok();
    }
    at.date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
}
