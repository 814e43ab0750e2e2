//! Reversal of recorded sync passes.
//!
//! Undo relies on the reconciler only ever appending: an updated event loses
//! exactly as many trailing description lines as the pass added, a created
//! event is deleted. Manual edits to a managed event after the pass make its
//! undo unreliable.

use chrono::NaiveDate;

use crate::calendar::{events_on, CalendarClient, EventUpdate};
use crate::config::Config;
use crate::error::Result;
use crate::history::{HistoryFileId, HistoryRecord, HistoryStore};
use crate::reconcile::find_managed;

/// Outcome of undoing one history file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoReport {
    pub file_id: HistoryFileId,
    /// Days whose managed event lost the lines the pass appended.
    pub restored: Vec<NaiveDate>,
    /// Days whose managed event was removed.
    pub deleted: Vec<NaiveDate>,
    /// Non-fatal problems, in the order they occurred.
    pub diagnostics: Vec<String>,
}

impl UndoReport {
    fn new(file_id: HistoryFileId) -> Self {
        Self {
            file_id,
            restored: Vec::new(),
            deleted: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn diagnose(&mut self, message: String) {
        tracing::warn!(id = %self.file_id, "{message}");
        self.diagnostics.push(message);
    }
}

/// Description with its last `count` lines removed.
pub fn drop_last_lines(description: &str, count: usize) -> String {
    let lines: Vec<&str> = description.split('\n').collect();
    let keep = lines.len().saturating_sub(count);
    lines[..keep].join("\n")
}

/// Issues compensating writes for recorded passes.
pub struct UndoEngine<'a, C: CalendarClient + ?Sized> {
    config: &'a Config,
    client: &'a C,
    store: &'a HistoryStore,
}

impl<'a, C: CalendarClient + ?Sized> UndoEngine<'a, C> {
    pub fn new(config: &'a Config, client: &'a C, store: &'a HistoryStore) -> Self {
        Self {
            config,
            client,
            store,
        }
    }

    /// Reverse one pass and delete its history file.
    ///
    /// A missing file or a day without a managed event is reported in
    /// [`UndoReport::diagnostics`] and skipped.
    ///
    /// # Errors
    ///
    /// Fails if the history file is unreadable or a remote write fails. Days
    /// reverted before the failure stay reverted and the file is kept.
    pub fn undo(&self, file_id: &HistoryFileId) -> Result<UndoReport> {
        let mut report = UndoReport::new(*file_id);

        let Some(records) = self.store.load(file_id)? else {
            report.diagnose(format!("history file {file_id} not found; nothing to undo"));
            return Ok(report);
        };

        for record in &records {
            self.undo_record(record, &mut report)?;
        }

        if !self.store.delete(file_id) {
            report.diagnose(format!("could not delete history file {file_id}"));
        }

        tracing::info!(
            id = %file_id,
            restored = report.restored.len(),
            deleted = report.deleted.len(),
            "undid sync pass"
        );
        Ok(report)
    }

    /// Undo several passes in the given order, stopping at the first error.
    pub fn undo_all(&self, file_ids: &[HistoryFileId]) -> Result<Vec<UndoReport>> {
        file_ids.iter().map(|id| self.undo(id)).collect()
    }

    fn undo_record(&self, record: &HistoryRecord, report: &mut UndoReport) -> Result<()> {
        let events = events_on(self.client, record.date);
        let Some(event) = find_managed(&events, &self.config.event_name) else {
            report.diagnose(format!("cannot find event for date {}", record.date));
            return Ok(());
        };

        if record.updated_existing_event {
            let description = drop_last_lines(
                event.description.as_deref().unwrap_or_default(),
                record.tasks.len(),
            );
            self.client
                .update_event(&event.id, &EventUpdate::with_description(event, description))?;
            tracing::info!(date = %record.date, event_id = %event.id, removed = record.tasks.len(), "removed appended tasks");
            report.restored.push(record.date);
        } else {
            self.client.delete_event(&event.id)?;
            tracing::info!(date = %record.date, event_id = %event.id, "deleted managed event");
            report.deleted.push(record.date);
        }
        Ok(())
    }
}
