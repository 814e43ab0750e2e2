use std::path::Path;

use taskcal_core::{pipeline, CalendarClient, InMemoryCalendar};

use crate::context::{self, CliResult};
use crate::render;

pub fn run(config_path: Option<&Path>, offline: bool) -> CliResult {
    let config = context::load_config(config_path)?;

    let local;
    let google;
    let client: &dyn CalendarClient = if offline {
        local = InMemoryCalendar::new();
        &local
    } else {
        google = context::google_client(&config)?;
        &google
    };

    let outcome = pipeline::plan(&config, client, context::now(&config));
    print!("{}", render::schedule_grid(&outcome.schedule));
    print!("{}", render::warnings(&outcome.warnings));
    Ok(())
}
