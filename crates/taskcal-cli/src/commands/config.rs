use std::path::Path;

use clap::Subcommand;

use crate::context::{self, CliResult};
use crate::render;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and print a summary
    Check,
    /// Print the configuration file path
    Path,
}

pub fn run(config_path: Option<&Path>, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Check => {
            let path = context::config_path(config_path)?;
            let config = context::load_config(Some(&path))?;
            println!("{}: ok", path.display());
            print!("{}", render::config_summary(&config));
        }
        ConfigAction::Path => {
            println!("{}", context::config_path(config_path)?.display());
        }
    }
    Ok(())
}
