use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};
use std::io;

use crate::cli::Cli;

/// Print the completion script for `shell` on stdout
///
/// ```bash
/// esctl completion bash > /etc/bash_completion.d/esctl
/// ```
pub fn handle(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}
