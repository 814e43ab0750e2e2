use std::path::Path;

use chrono::NaiveDateTime;
use clap::Subcommand;
use taskcal_core::pipeline::{self, Decision, Preview, UndoSelection};
use taskcal_core::HistoryFileId;

use crate::context::{self, CliResult};
use crate::{prompt, render};

#[derive(Subcommand)]
pub enum UndoAction {
    /// Undo the most recent sync passes
    Last {
        /// Number of passes
        #[arg(default_value_t = 1)]
        n: usize,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Undo every pass recorded after a date-time
    Since {
        /// YYYY-MM-DDTHH:MM[:SS], local time
        #[arg(value_parser = parse_datetime)]
        at: NaiveDateTime,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Undo specific history files, in the given order
    File {
        /// History identifiers (YYYYMMDDHHMMSS)
        #[arg(required = true, value_parser = parse_id)]
        ids: Vec<HistoryFileId>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(config_path: Option<&Path>, action: UndoAction) -> CliResult {
    let (selection, yes) = match action {
        UndoAction::Last { n, yes } => (UndoSelection::LastN(n), yes),
        UndoAction::Since { at, yes } => (UndoSelection::Since(at), yes),
        UndoAction::File { ids, yes } => (UndoSelection::Files(ids), yes),
    };

    let config = context::load_config(config_path)?;
    let client = context::google_client(&config)?;
    let store = context::history_store(&config);

    let decision = pipeline::undo(&config, &client, &store, &selection, |preview| {
        if let Preview::Undo(changes) = preview {
            println!("Expected changes:");
            print!("{}", render::undo_preview(changes));
        }
        yes || prompt::confirm("Apply these changes?")
    })?;

    match decision {
        Decision::Declined => println!("Changes have not been applied."),
        Decision::Applied(reports) if reports.is_empty() => println!("Nothing to undo."),
        Decision::Applied(reports) => {
            for report in &reports {
                print!("{}", render::undo_report(report));
            }
        }
    }
    Ok(())
}

pub(crate) fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s.trim(), format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM[:SS], got \"{s}\""))
}

pub(crate) fn parse_id(s: &str) -> Result<HistoryFileId, String> {
    s.parse().map_err(|e: taskcal_core::HistoryError| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetimes_accept_optional_seconds() {
        let expected = chrono::NaiveDate::from_ymd_opt(2023, 10, 20)
            .unwrap()
            .and_hms_opt(12, 37, 0)
            .unwrap();
        assert_eq!(parse_datetime("2023-10-20T12:37").unwrap(), expected);
        assert_eq!(parse_datetime("2023-10-20 12:37:00").unwrap(), expected);
        assert!(parse_datetime("2023-10-20").is_err());
    }

    #[test]
    fn ids_are_validated() {
        assert!(parse_id("20240101090000").is_ok());
        assert!(parse_id("latest").is_err());
    }
}
