//! End-to-end operations with an injected confirmation step.
//!
//! Every writing operation computes its effect first, hands a [`Preview`] to
//! the caller's decision function and only touches the calendar when that
//! function returns `true`. The core never prompts on its own.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;

use crate::calendar::{CalendarClient, RemoteEvent};
use crate::cleanup::{delete_events, find_matching_events};
use crate::config::Config;
use crate::error::Result;
use crate::history::{HistoryFileId, HistoryRecord, HistoryStore};
use crate::reconcile::Reconciler;
use crate::scheduler::{ScheduleOutcome, Scheduler};
use crate::undo::{UndoEngine, UndoReport};

/// What a writing operation is about to do.
#[derive(Debug)]
pub enum Preview<'p> {
    Schedule(&'p ScheduleOutcome),
    Undo(&'p UndoPreview),
    Purge(&'p [RemoteEvent]),
}

/// Whether the caller let the operation proceed.
#[derive(Debug)]
pub enum Decision<T> {
    Applied(T),
    Declined,
}

impl<T> Decision<T> {
    pub fn is_declined(&self) -> bool {
        matches!(self, Decision::Declined)
    }
}

/// Result of an accepted apply.
#[derive(Debug)]
pub struct ApplyReport {
    pub outcome: ScheduleOutcome,
    /// `None` when there was nothing to write.
    pub history_id: Option<HistoryFileId>,
    pub records: Vec<HistoryRecord>,
}

/// Which recorded passes to undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoSelection {
    /// The most recent `n` passes.
    LastN(usize),
    /// Every pass recorded after the instant.
    Since(NaiveDateTime),
    /// Explicit identifiers, undone in the given order.
    Files(Vec<HistoryFileId>),
}

/// Files about to be undone and their records grouped by date.
#[derive(Debug, Clone)]
pub struct UndoPreview {
    pub file_ids: Vec<HistoryFileId>,
    pub changes: IndexMap<NaiveDate, Vec<HistoryRecord>>,
}

/// Compute the schedule without writing anything.
pub fn plan<C: CalendarClient + ?Sized>(
    config: &Config,
    client: &C,
    now: NaiveDateTime,
) -> ScheduleOutcome {
    Scheduler::new(config, client, now).compute_schedule()
}

/// Schedule, confirm, reconcile and record one pass.
///
/// An empty schedule is reported without asking and without writing a
/// history file.
pub fn apply<C, F>(
    config: &Config,
    client: &C,
    store: &HistoryStore,
    now: NaiveDateTime,
    confirm: F,
) -> Result<Decision<ApplyReport>>
where
    C: CalendarClient + ?Sized,
    F: FnOnce(&Preview<'_>) -> bool,
{
    let outcome = plan(config, client, now);
    if outcome.schedule.is_empty() {
        tracing::info!("nothing to schedule");
        return Ok(Decision::Applied(ApplyReport {
            outcome,
            history_id: None,
            records: Vec::new(),
        }));
    }
    if !confirm(&Preview::Schedule(&outcome)) {
        tracing::info!("apply declined");
        return Ok(Decision::Declined);
    }

    let records = Reconciler::new(config, client).apply(&outcome.schedule)?;
    let history_id = store.save(&records)?;
    Ok(Decision::Applied(ApplyReport {
        outcome,
        history_id: Some(history_id),
        records,
    }))
}

/// Resolve a selection to history identifiers.
pub fn select_history(
    store: &HistoryStore,
    selection: &UndoSelection,
) -> Result<Vec<HistoryFileId>> {
    let ids = match selection {
        UndoSelection::LastN(n) => store.list_last_n(*n)?,
        UndoSelection::Since(instant) => store.list_files_before(*instant)?,
        UndoSelection::Files(ids) => ids.clone(),
    };
    Ok(ids)
}

/// Aggregated view of what undoing `file_ids` would revert.
pub fn preview_undo(store: &HistoryStore, file_ids: Vec<HistoryFileId>) -> Result<UndoPreview> {
    let changes = store.aggregate(&file_ids)?;
    Ok(UndoPreview { file_ids, changes })
}

/// Preview, confirm and undo the selected passes.
///
/// An empty selection is returned as an empty report list without asking.
pub fn undo<C, F>(
    config: &Config,
    client: &C,
    store: &HistoryStore,
    selection: &UndoSelection,
    confirm: F,
) -> Result<Decision<Vec<UndoReport>>>
where
    C: CalendarClient + ?Sized,
    F: FnOnce(&Preview<'_>) -> bool,
{
    let ids = select_history(store, selection)?;
    if ids.is_empty() {
        tracing::info!(?selection, "no history files selected");
        return Ok(Decision::Applied(Vec::new()));
    }

    let preview = preview_undo(store, ids)?;
    if !confirm(&Preview::Undo(&preview)) {
        tracing::info!("undo declined");
        return Ok(Decision::Declined);
    }

    let reports = UndoEngine::new(config, client, store).undo_all(&preview.file_ids)?;
    Ok(Decision::Applied(reports))
}

/// Find events matching `pattern`, confirm and delete them.
///
/// Returns the number of deleted events; no match deletes nothing without
/// asking.
pub fn purge<C, F>(
    client: &C,
    pattern: &str,
    from: NaiveDate,
    to: NaiveDate,
    confirm: F,
) -> Result<Decision<usize>>
where
    C: CalendarClient + ?Sized,
    F: FnOnce(&Preview<'_>) -> bool,
{
    let events = find_matching_events(client, pattern, from, to);
    if events.is_empty() {
        return Ok(Decision::Applied(0));
    }
    if !confirm(&Preview::Purge(&events)) {
        tracing::info!("purge declined");
        return Ok(Decision::Declined);
    }
    Ok(Decision::Applied(delete_events(client, &events)?))
}
