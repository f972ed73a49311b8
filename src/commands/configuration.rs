//! Configuration section: delegates to the reconciliation driver

use crate::cli::Action;
use crate::config::ConfigDocument;
use crate::error::Result;
use crate::exec::Runner;
use crate::paths::Paths;
use crate::reconcile;

/// Reconcile or report the configuration of every managed package.
pub fn run(doc: &ConfigDocument, action: Action, runner: &Runner, paths: &Paths) -> Result<()> {
    reconcile::reconcile(doc, action, runner, paths)
}
