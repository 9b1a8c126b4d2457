//! Completions command

use clap::CommandFactory;
use clap_complete::generate;

/// Generate shell completions
pub(crate) fn completions(shell: clap_complete::Shell) {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "lgpm", &mut std::io::stdout());
}
