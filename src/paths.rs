//! Well-known filesystem locations, threaded explicitly for testability

use std::path::PathBuf;

/// Filesystem locations declarch reads from and writes to.
///
/// Production code uses [`Paths::default`]; unit tests substitute temporary
/// directories so no test ever touches the real pacman cache or `/etc`.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Directory of immutable package archives kept by pacman.
    pub pacman_cache: PathBuf,
    /// Scratch extraction directory, exclusively owned by one package's
    /// reconciliation pass at a time.
    pub scratch_root: PathBuf,
    /// Root the reference tree is compared against and reconciled into.
    pub live_root: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            pacman_cache: PathBuf::from("/var/cache/pacman/pkg"),
            scratch_root: PathBuf::from("/tmp/declarch"),
            live_root: PathBuf::from("/"),
        }
    }
}

/// Directory containing the bundled helper shell scripts.
///
/// Resolved relative to the running executable, falling back to the current
/// directory when the executable path cannot be determined.
pub fn helpers_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("helpers")))
        .unwrap_or_else(|| PathBuf::from("helpers"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = Paths::default();
        assert_eq!(paths.pacman_cache, PathBuf::from("/var/cache/pacman/pkg"));
        assert_eq!(paths.scratch_root, PathBuf::from("/tmp/declarch"));
        assert_eq!(paths.live_root, PathBuf::from("/"));
    }

    #[test]
    fn test_helpers_dir_is_not_empty() {
        assert!(!helpers_dir().as_os_str().is_empty());
    }
}
