//! Shell completions command - Generate shell completion scripts

use std::io;

use clap::Command;
use clap_complete::{generate, shells};
use colored::Colorize;
use serde::Serialize;

use crate::output::{Output, OutputFormat, TableDisplay};

const BIN_NAME: &str = "chlog";

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shell::Bash => write!(f, "bash"),
            Shell::Zsh => write!(f, "zsh"),
            Shell::Fish => write!(f, "fish"),
            Shell::PowerShell => write!(f, "powershell"),
            Shell::Elvish => write!(f, "elvish"),
        }
    }
}

/// Instructions for installing completions
#[derive(Debug, Serialize)]
pub struct CompletionInstructions {
    pub shell: String,
    pub instructions: Vec<String>,
}

impl TableDisplay for CompletionInstructions {
    fn to_table(&self) -> String {
        let mut output = format!(
            "{} completions for {}\n\n{}\n",
            BIN_NAME.cyan().bold(),
            self.shell.yellow(),
            "Installation:".cyan().bold()
        );
        for instruction in &self.instructions {
            output.push_str(&format!("  {}\n", instruction));
        }
        output
    }
}

fn get_instructions(shell: Shell) -> Vec<String> {
    match shell {
        Shell::Bash => vec![
            "# Add to ~/.bashrc:".to_string(),
            "eval \"$(chlog completions bash)\"".to_string(),
        ],
        Shell::Zsh => vec![
            "# Save to a file in fpath:".to_string(),
            "chlog completions zsh > ~/.zfunc/_chlog".to_string(),
            "# Then add to ~/.zshrc before compinit:".to_string(),
            "fpath=(~/.zfunc $fpath)".to_string(),
        ],
        Shell::Fish => vec![
            "# Save to fish completions directory:".to_string(),
            "chlog completions fish > ~/.config/fish/completions/chlog.fish".to_string(),
        ],
        Shell::PowerShell => vec![
            "# Add to $PROFILE:".to_string(),
            "Invoke-Expression (& chlog completions powershell | Out-String)".to_string(),
        ],
        Shell::Elvish => vec![
            "# Add to ~/.elvish/rc.elv:".to_string(),
            "eval (chlog completions elvish | slurp)".to_string(),
        ],
    }
}

/// Write the completion script for `shell` to stdout.
pub fn generate_completions_with_cmd(shell: Shell, cmd: &mut Command) {
    let mut out = io::stdout();
    match shell {
        Shell::Bash => generate(shells::Bash, cmd, BIN_NAME, &mut out),
        Shell::Zsh => generate(shells::Zsh, cmd, BIN_NAME, &mut out),
        Shell::Fish => generate(shells::Fish, cmd, BIN_NAME, &mut out),
        Shell::PowerShell => generate(shells::PowerShell, cmd, BIN_NAME, &mut out),
        Shell::Elvish => generate(shells::Elvish, cmd, BIN_NAME, &mut out),
    }
}

/// Print installation instructions for `shell`.
pub fn show_instructions(shell: Shell, format: OutputFormat) -> anyhow::Result<()> {
    let instructions = CompletionInstructions {
        shell: shell.to_string(),
        instructions: get_instructions(shell),
    };
    Output::new(instructions, format).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_display() {
        assert_eq!(Shell::Bash.to_string(), "bash");
        assert_eq!(Shell::PowerShell.to_string(), "powershell");
    }

    #[test]
    fn test_get_instructions() {
        assert!(get_instructions(Shell::Bash)
            .iter()
            .any(|i| i.contains("bashrc")));
        assert!(get_instructions(Shell::Fish)
            .iter()
            .any(|i| i.contains("chlog.fish")));
    }
}
