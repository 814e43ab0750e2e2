use std::path::Path;

use clap::Subcommand;
use taskcal_core::HistoryFileId;

use crate::commands::undo::parse_id;
use crate::context::{self, CliResult};
use crate::render;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sync passes, newest first
    List {
        /// Show only the most recent N
        #[arg(long)]
        last: Option<usize>,
    },
    /// Show the records of history files
    Show {
        #[arg(required = true, value_parser = parse_id)]
        ids: Vec<HistoryFileId>,
    },
}

pub fn run(config_path: Option<&Path>, action: HistoryAction) -> CliResult {
    let config = context::load_config(config_path)?;
    let store = context::history_store(&config);

    match action {
        HistoryAction::List { last } => {
            let ids = match last {
                Some(n) => store.list_last_n(n)?,
                None => store.list_all()?,
            };
            let mut entries = Vec::with_capacity(ids.len());
            for id in ids {
                let records = store.load(&id)?.unwrap_or_default();
                entries.push((id, records));
            }
            print!("{}", render::history_list(&entries));
        }
        HistoryAction::Show { ids } => {
            for id in ids {
                match store.load(&id)? {
                    Some(records) => print!("{}", render::history_records(&id, &records)),
                    None => return Err(format!("history file {id} not found").into()),
                }
            }
        }
    }
    Ok(())
}
