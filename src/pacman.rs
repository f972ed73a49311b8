//! Package manager adapter
//!
//! Queries the local pacman database and sync repositories through the
//! `pacman` command-line tool. Queries are read-only and always execute,
//! even under dry mode; installs go through the dry-aware [`Runner`].
//!
//! The [`PackageManager`] trait is the seam unit tests stub out.

use std::collections::BTreeSet;
use std::process::Command;

use crate::error::{DeclarchError, Result};
use crate::exec::Runner;

/// Capabilities declarch needs from the system package manager.
pub trait PackageManager {
    /// Names of all natively installed packages.
    fn installed(&self) -> Result<BTreeSet<String>>;

    /// Explicitly installed packages not required by anything else.
    fn explicit_leaves(&self) -> Result<BTreeSet<String>>;

    /// Foreign (e.g. AUR-built) installed packages.
    fn foreign(&self) -> Result<BTreeSet<String>>;

    /// All known package group names.
    fn groups(&self) -> Result<BTreeSet<String>>;

    /// Member packages of one group.
    fn group_members(&self, group: &str) -> Result<BTreeSet<String>>;

    /// Install packages, skipping ones already present. Fatal on failure.
    fn install(&self, runner: &Runner, packages: &str) -> Result<()>;
}

/// Adapter over the `pacman` binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacmanCli;

impl PacmanCli {
    fn query(&self, args: &[&str]) -> Result<BTreeSet<String>> {
        let command = format!("pacman {}", args.join(" "));

        let output = Command::new("pacman").args(args).output().map_err(|e| {
            DeclarchError::PackageManagerFailed {
                command: command.clone(),
                reason: format!("{e}. Is pacman installed?"),
            }
        })?;

        if !output.status.success() {
            return Err(DeclarchError::PackageManagerFailed {
                command,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_package_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl PackageManager for PacmanCli {
    fn installed(&self) -> Result<BTreeSet<String>> {
        self.query(&["-Qqn"])
    }

    fn explicit_leaves(&self) -> Result<BTreeSet<String>> {
        self.query(&["-Qqetn"])
    }

    fn foreign(&self) -> Result<BTreeSet<String>> {
        self.query(&["-Qqm"])
    }

    fn groups(&self) -> Result<BTreeSet<String>> {
        self.query(&["-Sgq"])
    }

    fn group_members(&self, group: &str) -> Result<BTreeSet<String>> {
        self.query(&["-Sgq", group])
    }

    fn install(&self, runner: &Runner, packages: &str) -> Result<()> {
        runner.run_checked(&format!("pacman -S --needed --noconfirm {packages}"))
    }
}

/// One package name per line, blanks discarded.
fn parse_package_lines(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
