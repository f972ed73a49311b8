//! Users section: provision or report declared user accounts

use crate::cli::Action;
use crate::config::ConfigDocument;
use crate::error::Result;
use crate::exec::Runner;
use crate::users;

/// Provision declared users (`sync`) or report divergence (`diff`).
pub fn run(doc: &ConfigDocument, action: Action, runner: &Runner) -> Result<()> {
    match action {
        Action::Sync => users::sync(doc, runner),
        Action::Diff => {
            users::diff(doc);
            Ok(())
        }
    }
}
