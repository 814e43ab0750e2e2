//! # taskcal Core Library
//!
//! Schedules recurring personal tasks and keeps them on a remote calendar as
//! one managed event per day, with a history of every sync pass so it can be
//! undone. The `taskcal` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Scheduler**: places tasks on dates, honoring intervals, avoided days,
//!   category exclusivity, a per-day limit and the event horizon
//! - **Reconciler**: merges a schedule into the calendar (create vs. append)
//!   and emits history records
//! - **History**: JSON files keyed by `YYYYMMDDHHMMSS`
//! - **Undo**: reverses a recorded pass through the same calendar interface
//!
//! ## Key Components
//!
//! - [`Scheduler`]: schedule computation
//! - [`Reconciler`]: calendar writes
//! - [`HistoryStore`]: pass persistence
//! - [`UndoEngine`]: pass reversal
//! - [`CalendarClient`]: the remote calendar seam

pub mod calendar;
pub mod cleanup;
pub mod config;
pub mod credentials;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;
pub mod undo;

pub use calendar::{CalendarClient, GoogleCalendarClient, InMemoryCalendar, RemoteEvent};
pub use config::{Config, StartAnchor, TaskDefinition};
pub use error::{CalendarError, ConfigError, CoreError, HistoryError};
pub use history::{HistoryFileId, HistoryRecord, HistoryStore};
pub use pipeline::{Decision, Preview, UndoSelection};
pub use reconcile::Reconciler;
pub use scheduler::{DelayWarning, Schedule, ScheduleOutcome, ScheduledTask, Scheduler};
pub use undo::{UndoEngine, UndoReport};
