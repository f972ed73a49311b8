//! Shell command execution with dry-run and verbose support
//!
//! Every side-effecting operation in declarch goes through a [`Runner`], so
//! dry mode is enforced in exactly one place. Read-side operations (package
//! manager queries, archive extraction into the scratch root) bypass the dry
//! flag via [`Runner::run_always`], keeping diff output accurate even under
//! `--dry`.

use std::process::Command;

use crate::error::{DeclarchError, Result};

/// Executes shell commands, honoring the dry and verbose flags.
///
/// `Runner` is cheap to copy and is passed explicitly into every component
/// that performs external effects; there is no ambient global state.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    pub dry: bool,
    pub verbose: bool,
}

impl Runner {
    pub fn new(dry: bool, verbose: bool) -> Self {
        Self { dry, verbose }
    }

    /// Run a shell command line. Under dry mode the command is logged and
    /// reported as successful without being executed.
    pub fn run(&self, command: &str) -> Result<i32> {
        if self.verbose || self.dry {
            println!("Running \"{command}\"");
        }

        if self.dry {
            return Ok(0);
        }

        self.spawn(command)
    }

    /// Run a shell command line even under dry mode.
    ///
    /// Only for read-side steps whose effects are confined to the scratch
    /// root; anything touching the live system must go through [`Self::run`].
    pub fn run_always(&self, command: &str) -> Result<i32> {
        if self.verbose {
            println!("Running \"{command}\"");
        }

        self.spawn(command)
    }

    fn spawn(&self, command: &str) -> Result<i32> {
        // Not every command line is a package manager call; report spawn
        // failures neutrally.
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|e| DeclarchError::CommandFailed {
                command: command.to_string(),
                reason: e.to_string(),
            })?;

        Ok(status.code().unwrap_or(-1))
    }

    /// Copy a file over `dst`, creating parent directories as needed and
    /// preserving the source file mode. Logged but not performed under dry
    /// mode.
    pub fn copy_file(&self, src: &std::path::Path, dst: &std::path::Path) -> Result<()> {
        if self.verbose || self.dry {
            println!("Copying {} to {}", src.display(), dst.display());
        }

        if self.dry {
            return Ok(());
        }

        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DeclarchError::FileWriteFailed {
                path: dst.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        std::fs::copy(src, dst).map_err(|e| DeclarchError::FileWriteFailed {
            path: dst.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Run a command line and fail hard on a non-zero exit code.
    ///
    /// Used for package installs, where continuing after a failure would
    /// leave the machine in an undefined partial state.
    pub fn run_checked(&self, command: &str) -> Result<()> {
        let code = self.run(command)?;
        if code != 0 {
            return Err(DeclarchError::InstallFailed {
                command: command.to_string(),
                code,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_mode_skips_execution() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("marker");
        let runner = Runner::new(true, false);

        let code = runner
            .run(&format!("touch {}", marker.display()))
            .unwrap();

        assert_eq!(code, 0);
        assert!(!marker.exists());
    }

    #[test]
    fn test_run_always_executes_under_dry() {
        let temp = tempfile::TempDir::new().unwrap();
        let marker = temp.path().join("marker");
        let runner = Runner::new(true, false);

        runner
            .run_always(&format!("touch {}", marker.display()))
            .unwrap();

        assert!(marker.exists());
    }

    #[test]
    fn test_run_reports_exit_code() {
        let runner = Runner::new(false, false);
        let code = runner.run("exit 3").unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_run_checked_fails_on_nonzero() {
        let runner = Runner::new(false, false);
        let result = runner.run_checked("exit 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_run_checked_passes_under_dry() {
        let runner = Runner::new(true, false);
        runner.run_checked("exit 1").unwrap();
    }

    #[test]
    fn test_copy_file_creates_parents() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("src.conf");
        let dst = temp.path().join("nested/dir/dst.conf");
        std::fs::write(&src, "content").unwrap();

        let runner = Runner::new(false, false);
        runner.copy_file(&src, &dst).unwrap();

        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "content");
    }

    #[test]
    fn test_copy_file_dry_mode_no_write() {
        let temp = tempfile::TempDir::new().unwrap();
        let src = temp.path().join("src.conf");
        let dst = temp.path().join("dst.conf");
        std::fs::write(&src, "content").unwrap();

        let runner = Runner::new(true, false);
        runner.copy_file(&src, &dst).unwrap();

        assert!(!dst.exists());
    }
}
