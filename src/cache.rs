//! Package cache extraction into the scratch root
//!
//! Reconstructs a pristine reference copy of a package's shipped files by
//! unpacking its cached archive from the pacman cache. The scratch root is
//! a single directory reused serially, one package at a time; it is fully
//! cleared (hidden entries included) before every extraction so no file
//! from a previous package can leak into the next comparison.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{DeclarchError, Result};
use crate::paths::Paths;

/// Extract `package`'s cached archive into the scratch root and return the
/// scratch root path.
///
/// Extraction always runs, dry mode included: it writes only into the
/// scratch root and feeds the drift comparison that diff output depends on.
pub fn extract(package: &str, paths: &Paths) -> Result<PathBuf> {
    let scratch = &paths.scratch_root;
    fs::create_dir_all(scratch)?;
    clear_dir(scratch)?;

    let archive = find_archive(&paths.pacman_cache, package)?;
    unpack(&archive, scratch).map_err(|e| DeclarchError::ExtractionFailed {
        package: package.to_string(),
        reason: format!("{}: {e}", archive.display()),
    })?;

    Ok(scratch.clone())
}

/// Remove every entry of `dir`, hidden ones included. The directory itself
/// is kept.
fn clear_dir(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Locate the cached archive for `package` by name-prefix match.
///
/// The prefix is `"<name>-"` followed by a version digit, so `openssh`
/// never matches `openssh-askpass`. With several cached versions the
/// lexicographically last one wins.
fn find_archive(cache_dir: &Path, package: &str) -> Result<PathBuf> {
    let prefix = format!("{package}-");

    let mut matches: Vec<PathBuf> = fs::read_dir(cache_dir)
        .map_err(|_| DeclarchError::CacheMiss {
            package: package.to_string(),
            cache_dir: cache_dir.display().to_string(),
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .and_then(|name| name.strip_prefix(&prefix))
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_digit())
        })
        .filter(|path| path.extension().is_none_or(|e| e != "sig"))
        .collect();

    matches.sort();
    matches.pop().ok_or_else(|| DeclarchError::CacheMiss {
        package: package.to_string(),
        cache_dir: cache_dir.display().to_string(),
    })
}

/// Unpack a (possibly compressed) tar archive into `dest`.
fn unpack(archive: &Path, dest: &Path) -> std::io::Result<()> {
    let file = BufReader::new(File::open(archive)?);
    let reader: Box<dyn Read> = match archive.extension().and_then(|e| e.to_str()) {
        Some("zst") => Box::new(zstd::Decoder::new(file)?),
        Some("xz") => Box::new(xz2::read::XzDecoder::new(file)),
        Some("gz") => Box::new(flate2::read::GzDecoder::new(file)),
        _ => Box::new(file),
    };

    let mut tar = tar::Archive::new(reader);
    tar.set_preserve_permissions(true);
    tar.unpack(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn test_paths(temp: &TempDir) -> Paths {
        Paths {
            pacman_cache: temp.path().join("cache"),
            scratch_root: temp.path().join("scratch"),
            live_root: temp.path().join("live"),
        }
    }

    fn write_archive(cache_dir: &Path, name: &str, files: &[(&str, &str)]) {
        fs::create_dir_all(cache_dir).unwrap();
        let file = File::create(cache_dir.join(name)).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, path, content.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_extract_unpacks_archive() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        write_archive(
            &paths.pacman_cache,
            "openssh-9.6p1-1-x86_64.pkg.tar.gz",
            &[("etc/ssh/sshd_config", "Port 22\n")],
        );

        let scratch = extract("openssh", &paths).unwrap();
        let content = fs::read_to_string(scratch.join("etc/ssh/sshd_config")).unwrap();
        assert_eq!(content, "Port 22\n");
    }

    #[test]
    fn test_extract_clears_previous_contents() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        write_archive(
            &paths.pacman_cache,
            "vim-9.1-1-x86_64.pkg.tar.gz",
            &[("etc/vimrc", "set nocompatible\n")],
        );

        // Leftovers from an earlier package, hidden entries included
        fs::create_dir_all(paths.scratch_root.join("etc/old")).unwrap();
        let mut hidden = File::create(paths.scratch_root.join(".PKGINFO")).unwrap();
        hidden.write_all(b"pkgname = stale").unwrap();

        let scratch = extract("vim", &paths).unwrap();
        assert!(!scratch.join("etc/old").exists());
        assert!(!scratch.join(".PKGINFO").exists());
        assert!(scratch.join("etc/vimrc").exists());
    }

    #[test]
    fn test_cache_miss_when_no_archive() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        fs::create_dir_all(&paths.pacman_cache).unwrap();

        let err = extract("nonexistent", &paths).unwrap_err();
        assert!(matches!(err, DeclarchError::CacheMiss { .. }));
    }

    #[test]
    fn test_prefix_match_requires_version_digit() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        write_archive(
            &paths.pacman_cache,
            "openssh-askpass-1.0-1-x86_64.pkg.tar.gz",
            &[("etc/other", "x")],
        );

        // "openssh-askpass" must not satisfy a lookup for "openssh"
        let err = extract("openssh", &paths).unwrap_err();
        assert!(matches!(err, DeclarchError::CacheMiss { .. }));
    }

    #[test]
    fn test_newest_version_wins() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        write_archive(
            &paths.pacman_cache,
            "vim-9.0-1-x86_64.pkg.tar.gz",
            &[("etc/vimrc", "old")],
        );
        write_archive(
            &paths.pacman_cache,
            "vim-9.1-1-x86_64.pkg.tar.gz",
            &[("etc/vimrc", "new")],
        );

        let scratch = extract("vim", &paths).unwrap();
        assert_eq!(fs::read_to_string(scratch.join("etc/vimrc")).unwrap(), "new");
    }

    #[test]
    fn test_corrupt_archive_is_extraction_failure() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        fs::create_dir_all(&paths.pacman_cache).unwrap();
        fs::write(
            paths.pacman_cache.join("vim-9.1-1-x86_64.pkg.tar.gz"),
            b"not a tarball",
        )
        .unwrap();

        let err = extract("vim", &paths).unwrap_err();
        assert!(matches!(err, DeclarchError::ExtractionFailed { .. }));
    }
}
