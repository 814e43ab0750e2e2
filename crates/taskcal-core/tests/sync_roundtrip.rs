//! Integration tests for the schedule → reconcile → history → undo cycle.
//!
//! These run the whole pipeline against the in-memory calendar and check
//! that undo returns the calendar to its exact prior state.

use chrono::{NaiveDate, NaiveDateTime};
use taskcal_core::calendar::EventDateTime;
use taskcal_core::{
    CalendarClient, Config, HistoryStore, InMemoryCalendar, Reconciler, RemoteEvent, Scheduler,
    UndoEngine,
};
use tempfile::TempDir;

const CONFIG: &str = r##"
event_name = "#tasks for today"
task_phrase = "tasks"
horizon_days = 30
max_tasks_per_day = 3

[[tasks]]
name = "Water plants"
category = "home"
start_date = "2024-01-01"
intervals = [{ range = [3, 5], repetitions = 3 }]

[[tasks]]
name = "Run"
category = "body"
start_date = "2024-01-01"
avoid_days = { weekdays = [5, 6] }
intervals = [{ range = [2, 3], repetitions = 4 }]
"##;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

fn snapshot(calendar: &InMemoryCalendar) -> Vec<(String, Option<String>, Option<String>)> {
    calendar
        .events()
        .into_iter()
        .map(|e| (e.id, e.summary, e.description))
        .collect()
}

fn seed_managed(calendar: &InMemoryCalendar, day: u32, description: &str) {
    let at = NaiveDate::from_ymd_opt(2024, 1, day).unwrap().and_hms_opt(6, 0, 0).unwrap();
    calendar.insert(RemoteEvent {
        id: format!("pre-{day}"),
        summary: Some("#tasks for today".into()),
        description: Some(description.into()),
        start: EventDateTime::at(at, "Europe/Warsaw"),
        end: EventDateTime::at(at, "Europe/Warsaw"),
        color_id: Some("2".into()),
    });
}

#[test]
fn undo_restores_calendar_after_single_pass() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let dir = TempDir::new().unwrap();
    let store = HistoryStore::new(dir.path());
    let calendar = InMemoryCalendar::new();
    seed_managed(&calendar, 4, "- Laundry");
    let before = snapshot(&calendar);

    let outcome = Scheduler::new(&config, &calendar, now()).compute_schedule();
    let records = Reconciler::new(&config, &calendar).apply(&outcome.schedule).unwrap();
    let id = store.save_at(&records, now()).unwrap();

    assert!(records.iter().any(|r| r.updated_existing_event));
    assert!(records.iter().any(|r| !r.updated_existing_event));
    assert_ne!(snapshot(&calendar), before);

    let report = UndoEngine::new(&config, &calendar, &store).undo(&id).unwrap();
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    assert_eq!(snapshot(&calendar), before);
    assert_eq!(calendar.get("pre-4").unwrap().color_id.as_deref(), Some("2"));
    assert!(store.list_all().unwrap().is_empty());
}

#[test]
fn stacked_passes_undo_newest_first() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let dir = TempDir::new().unwrap();
    let store = HistoryStore::new(dir.path());
    let calendar = InMemoryCalendar::new();

    let outcome = Scheduler::new(&config, &calendar, now()).compute_schedule();
    let reconciler = Reconciler::new(&config, &calendar);

    let first = reconciler.apply(&outcome.schedule).unwrap();
    store.save_at(&first, now()).unwrap();
    let after_first = snapshot(&calendar);

    // Same schedule again: every day takes the update branch.
    let second = reconciler.apply(&outcome.schedule).unwrap();
    assert!(second.iter().all(|r| r.updated_existing_event));
    store.save_at(&second, now() + chrono::Duration::minutes(5)).unwrap();

    for event in calendar.events() {
        let description = event.description.unwrap_or_default();
        let lines: Vec<&str> = description.lines().collect();
        let half = lines.len() / 2;
        assert_eq!(lines[..half], lines[half..], "passes concatenate in order");
    }

    let engine = UndoEngine::new(&config, &calendar, &store);
    let newest = store.list_last_n(1).unwrap();
    engine.undo_all(&newest).unwrap();
    assert_eq!(snapshot(&calendar), after_first);

    let rest = store.list_all().unwrap();
    engine.undo_all(&rest).unwrap();
    assert!(calendar.events().is_empty());
}

#[test]
fn aggregated_preview_covers_all_selected_passes() {
    let config = Config::from_toml_str(CONFIG).unwrap();
    let dir = TempDir::new().unwrap();
    let store = HistoryStore::new(dir.path());
    let calendar = InMemoryCalendar::new();

    let outcome = Scheduler::new(&config, &calendar, now()).compute_schedule();
    let records = Reconciler::new(&config, &calendar).apply(&outcome.schedule).unwrap();
    store.save_at(&records, now()).unwrap();
    store
        .save_at(&records[..1], now() + chrono::Duration::minutes(1))
        .unwrap();

    let ids = store.list_all().unwrap();
    let grouped = store.aggregate(&ids).unwrap();
    assert_eq!(grouped.len(), outcome.schedule.len());
    assert_eq!(grouped[&records[0].date].len(), 2);
    // first key comes from the newest file
    assert_eq!(grouped.keys().next(), Some(&records[0].date));
}

#[test]
fn per_day_limit_sees_events_written_by_earlier_passes() {
    let mut config = Config::from_toml_str(CONFIG).unwrap();
    config.max_tasks_per_day = Some(1);
    let calendar = InMemoryCalendar::new();

    let first = Scheduler::new(&config, &calendar, now()).compute_schedule();
    Reconciler::new(&config, &calendar).apply(&first.schedule).unwrap();

    let second = Scheduler::new(&config, &calendar, now()).compute_schedule();
    for date in second.schedule.keys() {
        assert!(!first.schedule.contains_key(date), "{date} scheduled twice");
    }
    // listing still works through the trait object
    let client: &dyn CalendarClient = &calendar;
    let (start, end) = taskcal_core::calendar::day_window(*first.schedule.keys().next().unwrap());
    assert_eq!(client.list_events(start, end).unwrap().len(), 1);
}
