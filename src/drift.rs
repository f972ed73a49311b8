//! Configuration drift detection
//!
//! Walks the extracted reference tree under `<scratch>/etc` and compares
//! each shipped file against its live counterpart. Only `/etc` is
//! reconciled; everything else a package ships is none of our business.
//!
//! Traversal is sorted so logs and reports are reproducible, but callers
//! treat the result as a set.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use walkdir::WalkDir;

use crate::error::{DeclarchError, Result};

/// Archive bookkeeping files shipped inside package archives; never real
/// configuration, never compared.
pub const DIFF_IGNORE: [&str; 3] = [".BUILDINFO", ".PKGINFO", ".MTREE"];

/// A live file that diverges from the package's shipped reference copy,
/// or is missing from the live system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DriftRecord {
    /// Absolute path of the live file.
    pub live_path: PathBuf,
}

/// Compare the reference tree under `reference_root/etc` against the live
/// system rooted at `live_root`.
///
/// A reference directory with no live counterpart is logged and its whole
/// subtree skipped; it is never created here. Within existing directories
/// the comparison is shallow and per-file, skipping `ignore` names.
pub fn compare(
    reference_root: &Path,
    live_root: &Path,
    ignore: &[&str],
    verbose: bool,
) -> Result<Vec<DriftRecord>> {
    let reference_etc = reference_root.join("etc");
    if !reference_etc.is_dir() {
        // Package ships nothing under /etc
        return Ok(Vec::new());
    }

    let mut records = Vec::new();
    let mut walker = WalkDir::new(&reference_etc).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| DeclarchError::IoError {
            message: e.to_string(),
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(reference_root) else {
            continue;
        };
        let live_dir = live_root.join(relative);

        if !live_dir.is_dir() {
            if verbose {
                println!("{}: directory missing on live system", live_dir.display());
            }
            walker.skip_current_dir();
            continue;
        }

        compare_dir(entry.path(), &live_dir, ignore, &mut records)?;
    }

    Ok(records)
}

/// Shallow comparison of the files directly inside one directory pair.
fn compare_dir(
    reference_dir: &Path,
    live_dir: &Path,
    ignore: &[&str],
    records: &mut Vec<DriftRecord>,
) -> Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(reference_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name();
        if ignore.iter().any(|i| name.to_str() == Some(i)) {
            continue;
        }

        let live_file = live_dir.join(&name);
        if !live_file.is_file() || !files_equal(&entry.path(), &live_file)? {
            records.push(DriftRecord {
                live_path: live_file,
            });
        }
    }

    Ok(())
}

/// Byte-for-byte equality via BLAKE3 content hashes.
fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    Ok(hash_file(a)? == hash_file(b)?)
}

fn hash_file(path: &Path) -> Result<blake3::Hash> {
    let file = File::open(path).map_err(|e| DeclarchError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| DeclarchError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
