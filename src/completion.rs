//! # Shell Completion Module
//!
//! ```bash
//! setflow completion bash > ~/.local/share/bash-completion/completions/setflow
//! setflow completion zsh > ~/.config/zsh/completions/_setflow
//! setflow completion fish > ~/.config/fish/completions/setflow.fish
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell into `out`
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions on stdout
pub fn print_completions(shell: Shell, cmd: &mut Command) {
    generate_completions(shell_to_completion_shell(shell), cmd, &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use clap::CommandFactory;

    #[test]
    fn test_bash_completion_mentions_subcommands() {
        let mut out = Vec::new();
        generate_completions(CompletionShell::Bash, &mut Args::command(), &mut out);

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("_setflow"));
        assert!(script.contains("curve"));
        assert!(script.contains("sort"));
    }

    #[test]
    fn test_shell_mapping() {
        assert_eq!(shell_to_completion_shell(Shell::Fish), CompletionShell::Fish);
        assert_eq!(shell_to_completion_shell(Shell::PowerShell), CompletionShell::PowerShell);
    }
}
