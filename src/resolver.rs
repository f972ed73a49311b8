//! Package template resolution
//!
//! Flattens a document tree into the deduplicated desired package set,
//! expanding package-group references through the package manager adapter.
//!
//! Group expansion is single-level by design, matching pacman's own group
//! semantics: a group member that happens to share its name with another
//! group is taken literally. When a name is both a literal package and a
//! group, group expansion wins; this mirrors pacman behavior and is kept
//! deliberately.

use std::collections::BTreeSet;

use crate::config::ConfigDocument;
use crate::error::Result;
use crate::pacman::PackageManager;

/// Field prefix marking a package list inside the `packages`/`aur` sections.
const PACKAGE_FIELD_PREFIX: &str = "packages";

/// Resolve the desired package set for `doc` and all of its includes.
///
/// AUR fields are included when `expand_aur` is set; AUR names are a
/// separate namespace and never go through group expansion.
pub fn resolve(
    doc: &ConfigDocument,
    pm: &dyn PackageManager,
    expand_aur: bool,
) -> Result<BTreeSet<String>> {
    let groups = pm.groups()?;
    let mut template = BTreeSet::new();
    resolve_into(doc, pm, expand_aur, &groups, &mut template)?;
    Ok(template)
}

fn resolve_into(
    doc: &ConfigDocument,
    pm: &dyn PackageManager,
    expand_aur: bool,
    groups: &BTreeSet<String>,
    template: &mut BTreeSet<String>,
) -> Result<()> {
    for (field, list) in doc.string_fields(&doc.packages)? {
        if !field.starts_with(PACKAGE_FIELD_PREFIX) {
            continue;
        }
        for candidate in list.split_whitespace() {
            if groups.contains(candidate) {
                // One level only: members are literal even if they match
                // another group name.
                template.extend(pm.group_members(candidate)?);
            } else {
                template.insert(candidate.to_string());
            }
        }
    }

    if expand_aur {
        for (field, list) in doc.string_fields(&doc.aur)? {
            if !field.starts_with(PACKAGE_FIELD_PREFIX) {
                continue;
            }
            template.extend(list.split_whitespace().map(str::to_string));
        }
    }

    for child in &doc.children {
        resolve_into(child, pm, expand_aur, groups, template)?;
    }

    Ok(())
}
