//! AUR package section: sync and diff
//!
//! AUR packages are built by a throwaway `build` user running the bundled
//! helper script, then installed from the resulting archives. AUR names are
//! a separate namespace and never go through group expansion.

use std::collections::BTreeSet;

use console::style;

use crate::config::ConfigDocument;
use crate::error::Result;
use crate::exec::Runner;
use crate::pacman::PackageManager;
use crate::paths::helpers_dir;

/// Build and install every declared AUR package.
///
/// A failed build or install aborts the run, same policy as native
/// packages.
pub fn sync(doc: &ConfigDocument, runner: &Runner) -> Result<()> {
    let packages = aur_template(doc)?;
    if packages.is_empty() {
        return Ok(());
    }

    let helper = helpers_dir().join("aur.sh");
    runner.run("useradd -m build")?;
    runner.run(&format!("cp {} /home/build", helper.display()))?;

    let result = install_all(&packages, runner);

    // The build user goes away even when a package failed.
    runner.run("userdel build -r")?;
    result
}

fn install_all(packages: &BTreeSet<String>, runner: &Runner) -> Result<()> {
    for package in packages {
        runner.run_checked(&format!("sudo -u build /home/build/aur.sh {package}"))?;
        runner.run_checked(&format!(
            "pacman -U --needed --noconfirm /home/build/{package}/*.pkg.tar.zst"
        ))?;
    }
    Ok(())
}

/// Report how the foreign installed packages diverge from the AUR template.
pub fn diff(doc: &ConfigDocument, pm: &dyn PackageManager) -> Result<()> {
    let template = aur_template(doc)?;
    let foreign = pm.foreign()?;

    let missing: Vec<&str> = template.difference(&foreign).map(String::as_str).collect();
    let untracked: Vec<&str> = foreign.difference(&template).map(String::as_str).collect();
    let template: Vec<&str> = template.iter().map(String::as_str).collect();

    println!("{}\t{}", style("Template:").bold(), template.join(" "));
    println!("{}\t{}", style("Missing packages:").bold(), missing.join(" "));
    println!(
        "{}\t{}",
        style("Packages not in template:").bold(),
        untracked.join(" ")
    );
    Ok(())
}

/// Union of all AUR package fields across the document tree.
fn aur_template(doc: &ConfigDocument) -> Result<BTreeSet<String>> {
    let mut packages = BTreeSet::new();
    for document in doc.documents() {
        for (field, list) in document.string_fields(&document.aur)? {
            if !field.starts_with("packages") {
                continue;
            }
            packages.extend(list.split_whitespace().map(str::to_string));
        }
    }
    Ok(packages)
}
