//! Plain-text rendering of schedules, history and undo previews.

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{Datelike, Days, NaiveDate};
use taskcal_core::cleanup::display_summary;
use taskcal_core::pipeline::UndoPreview;
use taskcal_core::{
    Config, DelayWarning, HistoryFileId, HistoryRecord, RemoteEvent, Schedule, UndoReport,
};

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MIN_CELL: usize = 9;
const MAX_CELL: usize = 24;

/// Week-by-week grid of the schedule, Monday first. Weeks without tasks are
/// left out.
pub fn schedule_grid(schedule: &Schedule) -> String {
    if schedule.is_empty() {
        return "No tasks scheduled.\n".to_string();
    }

    let inner = schedule
        .values()
        .flatten()
        .map(|t| t.name.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(MIN_CELL, MAX_CELL);

    let mut weeks: BTreeMap<NaiveDate, [Vec<&str>; 7]> = BTreeMap::new();
    for (date, tasks) in schedule {
        let offset = date.weekday().num_days_from_monday();
        let monday = *date - Days::new(u64::from(offset));
        let cell = &mut weeks.entry(monday).or_default()[offset as usize];
        cell.extend(tasks.iter().map(|t| t.name.as_str()));
    }

    let separator = format!("+{}\n", format!("{}+", "-".repeat(inner + 2)).repeat(7));
    let mut out = String::new();
    for (monday, cells) in &weeks {
        out.push_str(&separator);
        out.push('|');
        for (i, label) in WEEKDAYS.iter().enumerate() {
            let day = *monday + Days::new(i as u64);
            let header = format!("{label} {}", day.format("%m-%d"));
            let _ = write!(out, " {} |", fit(&header, inner));
        }
        out.push('\n');
        out.push_str(&separator);

        let height = cells.iter().map(Vec::len).max().unwrap_or(0);
        for row in 0..height {
            out.push('|');
            for cell in cells {
                let text = cell.get(row).copied().unwrap_or("");
                let _ = write!(out, " {} |", fit(text, inner));
            }
            out.push('\n');
        }
    }
    out.push_str(&separator);

    let tasks: usize = schedule.values().map(Vec::len).sum();
    let _ = writeln!(out, "{tasks} task(s) on {} day(s)", schedule.len());
    out
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return format!("{text:<width$}");
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn warnings(warnings: &[DelayWarning]) -> String {
    let mut out = String::new();
    for w in warnings {
        let _ = writeln!(
            out,
            "warning: \"{}\" on {} is {} day(s) late, outside its {}-{} day range",
            w.task_name, w.date, w.delay_days, w.allowed.0, w.allowed.1
        );
    }
    out
}

/// Aggregated changes an undo would make.
pub fn undo_preview(preview: &UndoPreview) -> String {
    let mut out = String::new();
    let ids: Vec<String> = preview.file_ids.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "History files: {}", ids.join(", "));
    if preview.changes.is_empty() {
        out.push_str("No recorded changes.\n");
        return out;
    }
    for (date, records) in &preview.changes {
        let _ = writeln!(out, "{date}");
        for record in records {
            let action = if record.updated_existing_event {
                "remove from event"
            } else {
                "delete event"
            };
            let _ = writeln!(out, "  {action}: {}", record.tasks.join(", "));
        }
    }
    out
}

pub fn undo_report(report: &UndoReport) -> String {
    let mut out = format!(
        "undid {}: {} event(s) trimmed, {} deleted\n",
        report.file_id,
        report.restored.len(),
        report.deleted.len()
    );
    for note in &report.diagnostics {
        let _ = writeln!(out, "  note: {note}");
    }
    out
}

/// One line per history file: identifier, time, days and tasks touched.
pub fn history_list(entries: &[(HistoryFileId, Vec<HistoryRecord>)]) -> String {
    if entries.is_empty() {
        return "No history.\n".to_string();
    }
    let mut out = String::new();
    for (id, records) in entries {
        let tasks: usize = records.iter().map(|r| r.tasks.len()).sum();
        let _ = writeln!(
            out,
            "{id}  {}  {} day(s), {tasks} task(s)",
            id.timestamp().format("%Y-%m-%d %H:%M:%S"),
            records.len()
        );
    }
    out
}

pub fn history_records(id: &HistoryFileId, records: &[HistoryRecord]) -> String {
    let mut out = format!("{id}\n");
    for record in records {
        let kind = if record.updated_existing_event {
            "updated"
        } else {
            "created"
        };
        let _ = writeln!(out, "  {} [{kind}]", record.date);
        for task in &record.tasks {
            let _ = writeln!(out, "    - {task}");
        }
    }
    out
}

pub fn events(events: &[RemoteEvent]) -> String {
    let mut out = String::new();
    for event in events {
        let _ = writeln!(
            out,
            "- {} ({} - {})",
            display_summary(event),
            event.start.display(),
            event.end.display()
        );
    }
    out
}

pub fn config_summary(config: &Config) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "calendar:     {}", config.calendar_id);
    let _ = writeln!(out, "time zone:    {}", config.time_zone.name());
    let _ = writeln!(out, "event:        \"{}\" at {}", config.event_name, config.event_time.start.format("%H:%M"));
    let _ = writeln!(out, "task phrase:  \"{}\"", config.task_phrase);
    let limit = config
        .max_tasks_per_day
        .map_or_else(|| "none".to_string(), |max| max.to_string());
    let _ = writeln!(out, "daily limit:  {limit}");
    let _ = writeln!(out, "horizon:      {} day(s)", config.horizon_days);
    let _ = writeln!(out, "history:      {}", config.history_dir().display());
    let _ = writeln!(out, "tasks:        {}", config.tasks.len());
    for task in &config.tasks {
        let intervals: Vec<String> = task
            .intervals
            .iter()
            .map(|i| format!("{}-{}d x{}", i.min_days(), i.max_days(), i.repetitions))
            .collect();
        let _ = writeln!(
            out,
            "  {} [{}] from {}: {}",
            task.name,
            task.category,
            task.start_date,
            intervals.join(", ")
        );
    }
    out
}
