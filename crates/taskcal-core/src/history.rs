//! Sync history persistence.
//!
//! Every apply pass writes one file, `<dir>/<YYYYMMDDHHMMSS>.json`, holding
//! the records the reconciler emitted. Identifiers sort chronologically, so
//! listings are plain name sorts. Files whose names are not a timestamp are
//! ignored.

use std::cmp::Reverse;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

const ID_FORMAT: &str = "%Y%m%d%H%M%S";
const EXTENSION: &str = "json";

/// What one apply pass did to one day's managed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    /// Task names in the order they were written.
    pub tasks: Vec<String>,
    /// `true` if tasks were appended to an existing event, `false` if the
    /// event was created.
    #[serde(rename = "updatedExistingEvent")]
    pub updated_existing_event: bool,
}

/// `YYYYMMDDHHMMSS` identifier of a history file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HistoryFileId(NaiveDateTime);

impl HistoryFileId {
    /// Identifier for a pass at `at`, truncated to the second.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }

    fn file_name(&self) -> String {
        format!("{self}.{EXTENSION}")
    }
}

impl fmt::Display for HistoryFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(ID_FORMAT))
    }
}

impl FromStr for HistoryFileId {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_suffix(".json").unwrap_or(s);
        if s.len() != 14 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HistoryError::InvalidId(s.to_string()));
        }
        NaiveDateTime::parse_from_str(s, ID_FORMAT)
            .map(Self)
            .map_err(|_| HistoryError::InvalidId(s.to_string()))
    }
}

/// Directory of history files.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist one pass under the current local time.
    pub fn save(&self, records: &[HistoryRecord]) -> Result<HistoryFileId, HistoryError> {
        self.save_at(records, Local::now().naive_local())
    }

    /// Persist one pass under `at`. A file for the same second is replaced.
    pub fn save_at(
        &self,
        records: &[HistoryRecord],
        at: NaiveDateTime,
    ) -> Result<HistoryFileId, HistoryError> {
        let id = HistoryFileId::from_datetime(at);
        let path = self.path_of(&id);

        std::fs::create_dir_all(&self.dir).map_err(|source| HistoryError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let content = serde_json::to_string_pretty(records).map_err(|source| HistoryError::Json {
            path: path.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| HistoryError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(id = %id, records = records.len(), path = %path.display(), "saved sync history");
        Ok(id)
    }

    /// Records of one pass, or `None` if the file does not exist.
    pub fn load(&self, id: &HistoryFileId) -> Result<Option<Vec<HistoryRecord>>, HistoryError> {
        let path = self.path_of(id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(HistoryError::Io { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| HistoryError::Json { path, source })
    }

    /// Files recorded strictly after `instant`, newest first.
    ///
    /// The name is historical: the filter keeps later files, which is what
    /// "undo everything since" needs.
    pub fn list_files_before(
        &self,
        instant: NaiveDateTime,
    ) -> Result<Vec<HistoryFileId>, HistoryError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|id| id.timestamp() > instant)
            .collect())
    }

    /// The `n` most recent files, newest first.
    pub fn list_last_n(&self, n: usize) -> Result<Vec<HistoryFileId>, HistoryError> {
        let mut ids = self.list_all()?;
        ids.truncate(n);
        Ok(ids)
    }

    /// Every history file, newest first. A missing directory is empty.
    pub fn list_all(&self) -> Result<Vec<HistoryFileId>, HistoryError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut ids: Vec<HistoryFileId> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    return None;
                }
                path.file_stem()?.to_str()?.parse().ok()
            })
            .collect();
        ids.sort_by_key(|id| Reverse(*id));
        Ok(ids)
    }

    /// Remove a history file; failures are logged and reported as `false`.
    pub fn delete(&self, id: &HistoryFileId) -> bool {
        let path = self.path_of(id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(id = %id, "deleted history file");
                true
            }
            Err(e) => {
                tracing::warn!(id = %id, path = %path.display(), error = %e, "failed to delete history file");
                false
            }
        }
    }

    /// Group the records of several files by date.
    ///
    /// Dates appear in first-seen order over `ids`; records of one date keep
    /// file order then in-file order. Missing files contribute nothing.
    pub fn aggregate(
        &self,
        ids: &[HistoryFileId],
    ) -> Result<IndexMap<NaiveDate, Vec<HistoryRecord>>, HistoryError> {
        let mut grouped: IndexMap<NaiveDate, Vec<HistoryRecord>> = IndexMap::new();
        for id in ids {
            let Some(records) = self.load(id)? else {
                tracing::warn!(id = %id, "history file not found; skipping");
                continue;
            };
            for record in records {
                grouped.entry(record.date).or_default().push(record);
            }
        }
        Ok(grouped)
    }

    fn path_of(&self, id: &HistoryFileId) -> PathBuf {
        self.dir.join(id.file_name())
    }
}
