use std::path::Path;

use taskcal_core::pipeline::{self, Decision, Preview};

use crate::context::{self, CliResult};
use crate::{prompt, render};

pub fn run(config_path: Option<&Path>, yes: bool) -> CliResult {
    let config = context::load_config(config_path)?;
    let client = context::google_client(&config)?;
    let store = context::history_store(&config);

    let decision = pipeline::apply(&config, &client, &store, context::now(&config), |preview| {
        if let Preview::Schedule(outcome) = preview {
            println!("Scheduled tasks:");
            print!("{}", render::schedule_grid(&outcome.schedule));
            print!("{}", render::warnings(&outcome.warnings));
        }
        yes || prompt::confirm("Add these tasks to the calendar?")
    })?;

    match decision {
        Decision::Declined => println!("Tasks were not added to the calendar."),
        Decision::Applied(report) => match report.history_id {
            Some(id) => println!(
                "Added {} task(s) on {} day(s). History: {id}",
                report.outcome.task_count(),
                report.records.len()
            ),
            None => println!("No tasks scheduled."),
        },
    }
    Ok(())
}
