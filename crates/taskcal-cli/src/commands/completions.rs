use clap::CommandFactory;
use clap_complete::Shell;

use crate::context::CliResult;
use crate::Cli;

pub fn run(shell: Shell) -> CliResult {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
    Ok(())
}
