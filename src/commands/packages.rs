//! Native package section: sync and diff

use std::collections::BTreeSet;

use console::style;

use crate::config::ConfigDocument;
use crate::error::Result;
use crate::exec::Runner;
use crate::pacman::PackageManager;
use crate::resolver;

/// Install every declared package list, document by document.
///
/// Group names are passed through to pacman, which expands them natively.
/// A failed install aborts the run: continuing would leave the machine in
/// an undefined partial-install state.
pub fn sync(doc: &ConfigDocument, pm: &dyn PackageManager, runner: &Runner) -> Result<()> {
    for document in doc.documents() {
        for (field, list) in document.string_fields(&document.packages)? {
            if !field.starts_with("packages") {
                continue;
            }
            pm.install(runner, list)?;
        }
    }
    Ok(())
}

/// Report how the installed package set diverges from the template.
pub fn diff(doc: &ConfigDocument, pm: &dyn PackageManager) -> Result<()> {
    let template = resolver::resolve(doc, pm, false)?;
    let installed = pm.installed()?;
    let leaves = pm.explicit_leaves()?;

    print_sets(&template, &installed, &leaves);
    Ok(())
}

fn print_sets(
    template: &BTreeSet<String>,
    installed: &BTreeSet<String>,
    leaves: &BTreeSet<String>,
) {
    let missing: Vec<&str> = template
        .difference(installed)
        .map(String::as_str)
        .collect();
    let untracked: Vec<&str> = leaves.difference(template).map(String::as_str).collect();
    let template: Vec<&str> = template.iter().map(String::as_str).collect();

    println!("{}\t{}", style("Template:").bold(), template.join(" "));
    println!("{}\t{}", style("Missing packages:").bold(), missing.join(" "));
    println!(
        "{}\t{}",
        style("Packages not in template:").bold(),
        untracked.join(" ")
    );
}
