//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// declarch - declarative provisioning reconciler
///
/// Applies a declared machine state (packages, configuration overlays, user
/// accounts) or reports how the live system diverges from it.
#[derive(Parser, Debug)]
#[command(
    name = "declarch",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Declarative package and configuration reconciler for Arch Linux",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  declarch all sync base.json            \x1b[90m# Apply the whole declared state\x1b[0m\n   \
                  declarch packages diff base.json       \x1b[90m# Show template vs installed packages\x1b[0m\n   \
                  declarch configuration sync base.json extra.json --dry\n   \
                  declarch users sync base.json --verbose\n\n\
                  "
)]
pub struct Cli {
    /// Part of the declared state to process
    #[arg(value_enum, required_unless_present = "completions")]
    pub section: Option<Section>,

    /// Apply the declared state or report divergence
    #[arg(value_enum, required_unless_present = "completions")]
    pub action: Option<Action>,

    /// Primary configuration document, then extra include documents
    #[arg(value_name = "CONFIG", required_unless_present = "completions")]
    pub configs: Vec<PathBuf>,

    /// Log external effects instead of performing them
    #[arg(long, short = 'd')]
    pub dry: bool,

    /// Print every command before running it
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, hide = true)]
    pub completions: Option<Shell>,
}

/// Sections of the configuration documents.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Packages, configuration, and users, in that order
    All,
    /// Native package template
    Packages,
    /// AUR package template
    Aur,
    /// Per-package configuration overlays
    Configuration,
    /// User accounts
    Users,
}

/// What to do with the selected section.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Apply the declared state to the live system
    Sync,
    /// Report divergence without mutating anything
    Diff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::try_parse_from(["declarch", "packages", "diff", "base.json"]).unwrap();
        assert_eq!(cli.section, Some(Section::Packages));
        assert_eq!(cli.action, Some(Action::Diff));
        assert_eq!(cli.configs, vec![PathBuf::from("base.json")]);
        assert!(!cli.dry);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parsing_extra_configs_and_flags() {
        let cli = Cli::try_parse_from([
            "declarch",
            "configuration",
            "sync",
            "base.json",
            "extra.json",
            "--dry",
            "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.section, Some(Section::Configuration));
        assert_eq!(cli.action, Some(Action::Sync));
        assert_eq!(cli.configs.len(), 2);
        assert!(cli.dry);
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_rejects_unknown_section() {
        assert!(Cli::try_parse_from(["declarch", "kernel", "sync", "base.json"]).is_err());
    }

    #[test]
    fn test_cli_rejects_missing_config() {
        assert!(Cli::try_parse_from(["declarch", "all", "sync"]).is_err());
    }

    #[test]
    fn test_cli_completions_without_positionals() {
        let cli = Cli::try_parse_from(["declarch", "--completions", "bash"]).unwrap();
        assert!(cli.section.is_none());
        assert!(cli.completions.is_some());
    }
}
