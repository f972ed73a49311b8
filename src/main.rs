//! declarch - declarative provisioning reconciler for Arch Linux
//!
//! Reads a tree of JSON configuration documents describing the desired
//! machine state (packages, per-package configuration overlays, user
//! accounts) and either applies it (`sync`) or reports how the live system
//! diverges from it (`diff`).

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

mod cache;
mod cli;
mod commands;
mod config;
mod drift;
mod error;
mod exec;
mod pacman;
mod paths;
mod reconcile;
mod resolver;
mod users;

use cli::{Action, Cli, Section};
use error::{DeclarchError, Result};
use exec::Runner;
use pacman::PacmanCli;
use paths::Paths;

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "declarch", &mut std::io::stdout());
        return;
    }

    // clap guarantees the positionals whenever --completions is absent
    let (Some(section), Some(action)) = (cli.section, cli.action) else {
        eprintln!("Error: missing section or action");
        std::process::exit(2);
    };

    let runner = Runner::new(cli.dry, cli.verbose);

    if let Err(e) = run(section, action, &cli.configs, &runner) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(section: Section, action: Action, configs: &[PathBuf], runner: &Runner) -> Result<()> {
    let Some((primary, extra)) = configs.split_first() else {
        return Err(DeclarchError::ConfigNotFound {
            path: "<none given>".to_string(),
        });
    };

    let doc = config::load(primary, extra)?;
    let paths = Paths::default();
    let pm = PacmanCli;

    match section {
        Section::Packages => run_packages(&doc, action, runner, &pm),
        Section::Aur => run_aur(&doc, action, runner, &pm),
        Section::Configuration => commands::configuration::run(&doc, action, runner, &paths),
        Section::Users => commands::users::run(&doc, action, runner),
        Section::All => {
            run_packages(&doc, action, runner, &pm)?;
            // A package-scoped configuration failure must not keep the
            // users section from running; the non-zero exit still happens.
            let configuration = commands::configuration::run(&doc, action, runner, &paths);
            match &configuration {
                Ok(()) | Err(DeclarchError::ReconcileIncomplete { .. }) => {
                    commands::users::run(&doc, action, runner)?;
                    configuration
                }
                Err(_) => configuration,
            }
        }
    }
}

fn run_packages(
    doc: &config::ConfigDocument,
    action: Action,
    runner: &Runner,
    pm: &PacmanCli,
) -> Result<()> {
    match action {
        Action::Sync => commands::packages::sync(doc, pm, runner),
        Action::Diff => commands::packages::diff(doc, pm),
    }
}

fn run_aur(
    doc: &config::ConfigDocument,
    action: Action,
    runner: &Runner,
    pm: &PacmanCli,
) -> Result<()> {
    match action {
        Action::Sync => commands::aur::sync(doc, runner),
        Action::Diff => commands::aur::diff(doc, pm),
    }
}
