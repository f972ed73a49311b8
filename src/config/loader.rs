//! Configuration document loading
//!
//! Loads a root JSON document and eagerly resolves its include graph into an
//! immutable tree. Each document is loaded at most once per run; a cyclic
//! include graph fails with [`DeclarchError::CircularInclude`] instead of
//! recursing unboundedly.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ConfigDocument;
use crate::error::{DeclarchError, Result};

/// Load a document tree rooted at `path`.
///
/// `extra_includes` (from the command line) are appended to the root
/// document's own include list, never replacing it. They resolve against
/// the invocation directory; only document-declared includes are relative
/// to the declaring document.
pub fn load(path: &Path, extra_includes: &[PathBuf]) -> Result<ConfigDocument> {
    let invocation_dir = std::env::current_dir()?;
    let extras: Vec<PathBuf> = extra_includes
        .iter()
        .map(|extra| {
            if extra.is_absolute() {
                extra.clone()
            } else {
                invocation_dir.join(extra)
            }
        })
        .collect();

    let mut in_progress = Vec::new();
    let mut loaded = HashSet::new();
    let doc = load_inner(path, &extras, &mut in_progress, &mut loaded)?;
    // load_inner only returns None for an already-loaded document, which
    // cannot happen for the root.
    doc.ok_or_else(|| DeclarchError::ConfigNotFound {
        path: path.display().to_string(),
    })
}

fn load_inner(
    path: &Path,
    extra_includes: &[PathBuf],
    in_progress: &mut Vec<PathBuf>,
    loaded: &mut HashSet<PathBuf>,
) -> Result<Option<ConfigDocument>> {
    let canonical = path
        .canonicalize()
        .map_err(|_| DeclarchError::ConfigNotFound {
            path: path.display().to_string(),
        })?;

    if in_progress.contains(&canonical) {
        let mut chain: Vec<String> = in_progress
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        chain.push(canonical.display().to_string());
        return Err(DeclarchError::CircularInclude {
            chain: chain.join(" -> "),
        });
    }

    if !loaded.insert(canonical.clone()) {
        // Already part of the tree via another include; union semantics make
        // a second copy redundant.
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|_| DeclarchError::ConfigNotFound {
        path: path.display().to_string(),
    })?;

    let mut doc: ConfigDocument =
        serde_json::from_str(&content).map_err(|e| DeclarchError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    doc.path = path.to_path_buf();
    doc.include.extend(extra_includes.iter().cloned());

    let base_dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

    in_progress.push(canonical);
    let mut children = Vec::new();
    for include in &doc.include {
        let include_path = if include.is_absolute() {
            include.clone()
        } else {
            base_dir.join(include)
        };
        if let Some(child) = load_inner(&include_path, &[], in_progress, loaded)? {
            children.push(child);
        }
    }
    in_progress.pop();

    doc.children = children;
    Ok(Some(doc))
}
