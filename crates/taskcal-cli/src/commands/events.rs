use std::path::Path;

use chrono::NaiveDate;
use clap::Subcommand;
use taskcal_core::pipeline::{self, Decision, Preview};

use crate::context::{self, CliResult};
use crate::{prompt, render};

#[derive(Subcommand)]
pub enum EventsAction {
    /// Delete every event whose title contains a pattern
    Purge {
        /// Substring of the event title
        #[arg(long)]
        pattern: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(config_path: Option<&Path>, action: EventsAction) -> CliResult {
    let EventsAction::Purge {
        pattern,
        from,
        to,
        yes,
    } = action;
    if from > to {
        return Err(format!("--from {from} is after --to {to}").into());
    }

    let config = context::load_config(config_path)?;
    let client = context::google_client(&config)?;

    let decision = pipeline::purge(&client, &pattern, from, to, |preview| {
        if let Preview::Purge(events) = preview {
            println!("Matching events:");
            print!("{}", render::events(events));
        }
        yes || prompt::confirm("Delete these events?")
    })?;

    match decision {
        Decision::Declined => println!("Events were not deleted."),
        Decision::Applied(0) => println!("No events match \"{pattern}\"."),
        Decision::Applied(count) => println!("Deleted {count} event(s)."),
    }
    Ok(())
}
