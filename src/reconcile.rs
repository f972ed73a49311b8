//! Reconciliation of managed package configuration
//!
//! For every package in the configuration mapping, in document-declared
//! order: extract its pristine archive into the scratch root, replay the
//! declared file-edit commands against that reference copy, diff the result
//! against the live system, and either report the drift (`diff`) or copy the
//! reference files over the live ones (`sync`).
//!
//! Special settings (service enablement) run strictly after the file phase
//! and only once per package: a partially copied, still drifting config must
//! never get its dependent service enabled.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use console::style;

use crate::cache;
use crate::cli::Action;
use crate::config::{ConfigDocument, Setting};
use crate::drift::{self, DIFF_IGNORE};
use crate::error::{DeclarchError, Result};
use crate::exec::Runner;
use crate::paths::Paths;

/// Reconcile every configured package of the document tree.
///
/// Cache misses and extraction failures are package-scoped: they are
/// reported, the remaining packages are still processed, and the run ends
/// with [`DeclarchError::ReconcileIncomplete`]. Everything else is fatal.
pub fn reconcile(
    doc: &ConfigDocument,
    action: Action,
    runner: &Runner,
    paths: &Paths,
) -> Result<()> {
    if action == Action::Diff {
        println!("{}", style("==> Package differences:").bold());
    }

    let mut failed: Vec<String> = Vec::new();

    for (owner, package, raw) in doc.merged_configuration() {
        let settings = owner.package_settings(package, raw)?;

        match reconcile_package(package, &settings, action, runner, paths) {
            Ok(()) => {}
            Err(e @ (DeclarchError::CacheMiss { .. } | DeclarchError::ExtractionFailed { .. })) => {
                eprintln!("{}: {e}", style(package).red());
                failed.push(package.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(DeclarchError::ReconcileIncomplete {
            count: failed.len(),
            packages: failed.join(", "),
        })
    }
}

fn reconcile_package(
    package: &str,
    settings: &[(String, Setting)],
    action: Action,
    runner: &Runner,
    paths: &Paths,
) -> Result<()> {
    let records = reference_drift(package, settings, runner, paths)?;
    let scratch = &paths.scratch_root;

    if action == Action::Diff {
        if let Some(line) = drift_line(package, &records) {
            println!("{line}");
        }
        return Ok(());
    }

    // Drifted paths plus every declared file path: a declared file is
    // managed even when byte-identical, so its paired special action still
    // has a fully reconciled file to depend on.
    let mut subject: BTreeSet<PathBuf> = records.into_iter().map(|r| r.live_path).collect();
    for (_, setting) in settings {
        if let Setting::FileCommands { path, .. } = setting {
            subject.insert(paths.live_root.join(path.trim_start_matches('/')));
        }
    }

    for live_path in &subject {
        let Ok(relative) = live_path.strip_prefix(&paths.live_root) else {
            continue;
        };
        runner.copy_file(&scratch.join(relative), live_path)?;
    }

    // File phase complete; only now may the special settings run.
    for (_, setting) in settings {
        if let Setting::ServiceEnable(service) = setting {
            let code = runner.run(&format!("systemctl enable {service}"))?;
            if code != 0 {
                eprintln!("{package}: enabling service '{service}' exited with {code}");
            }
        }
    }

    Ok(())
}

/// Reconstruct the package's reference copy and compute its drift against
/// the live system.
///
/// Reads only: the archive is extracted into the scratch root and the
/// declared file-edit commands are replayed on that copy, dry mode
/// included. The result does not depend on the dry flag, so diff output is
/// identical between dry and live runs.
fn reference_drift(
    package: &str,
    settings: &[(String, Setting)],
    runner: &Runner,
    paths: &Paths,
) -> Result<Vec<drift::DriftRecord>> {
    let scratch = cache::extract(package, paths)?;

    for (key, setting) in settings {
        match setting {
            Setting::FileCommands { path, commands } => {
                let target = scratch_path(&scratch, path);
                for command in commands {
                    runner.run_always(&format!("{command} {}", target.display()))?;
                }
            }
            Setting::EnvironmentVars(_) => {
                eprintln!("{package}: setting '{key}' has no file counterpart, skipping");
            }
            Setting::ServiceEnable(_) => {}
        }
    }

    drift::compare(&scratch, &paths.live_root, &DIFF_IGNORE, runner.verbose)
}

/// Format one package's drift report line; `None` when nothing drifted.
fn drift_line(package: &str, records: &[drift::DriftRecord]) -> Option<String> {
    if records.is_empty() {
        return None;
    }
    let list: Vec<String> = records
        .iter()
        .map(|r| r.live_path.display().to_string())
        .collect();
    Some(format!(
        "{}: {} are different",
        style(package).bold(),
        list.join(" ")
    ))
}

/// Map a declared absolute file path onto the scratch tree.
fn scratch_path(scratch: &Path, declared: &str) -> PathBuf {
    scratch.join(declared.trim_start_matches('/'))
}
