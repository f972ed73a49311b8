//! Error types and handling for declarch
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Fatal errors (configuration loading, unknown user properties, failed
//! package installs) abort the whole run. Cache misses and extraction
//! failures are package-scoped: the reconciliation driver logs them,
//! continues with the next package, and exits non-zero at the end.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for declarch operations
#[derive(Error, Diagnostic, Debug)]
pub enum DeclarchError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(declarch::config::not_found),
        help("Check that the path exists and is readable")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(
        code(declarch::config::parse_failed),
        help("Configuration documents must be well-formed JSON objects")
    )]
    ConfigParseFailed { path: String, reason: String },

    #[error("Circular include detected: {chain}")]
    #[diagnostic(
        code(declarch::config::circular_include),
        help("Remove the cycle from the include lists of the listed documents")
    )]
    CircularInclude { chain: String },

    // Command execution errors
    #[error("Command failed to run: {command}: {reason}")]
    #[diagnostic(code(declarch::exec::command_failed))]
    CommandFailed { command: String, reason: String },

    // Package manager errors
    #[error("Package manager query failed: {command}: {reason}")]
    #[diagnostic(code(declarch::pacman::query_failed))]
    PackageManagerFailed { command: String, reason: String },

    #[error("Package install failed: {command} exited with {code}")]
    #[diagnostic(
        code(declarch::pacman::install_failed),
        help("The machine may be in a partial state; re-run after fixing the cause")
    )]
    InstallFailed { command: String, code: i32 },

    // Cache errors
    #[error("No cached archive for package '{package}' in {cache_dir}")]
    #[diagnostic(
        code(declarch::cache::miss),
        help("Install or download the package once so pacman caches its archive")
    )]
    CacheMiss { package: String, cache_dir: String },

    #[error("Failed to extract archive for package '{package}': {reason}")]
    #[diagnostic(code(declarch::cache::extraction_failed))]
    ExtractionFailed { package: String, reason: String },

    #[error("Reconciliation failed for {count} package(s): {packages}")]
    #[diagnostic(
        code(declarch::reconcile::incomplete),
        help("See the per-package messages above; remaining packages were still processed")
    )]
    ReconcileIncomplete { count: usize, packages: String },

    // User provisioning errors
    #[error("Invalid user property '{property}' in user '{user}'")]
    #[diagnostic(
        code(declarch::users::invalid_property),
        help("Valid properties: setup, environment, dotfiles, scripts, home")
    )]
    InvalidUserProperty { user: String, property: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(declarch::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(declarch::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(declarch::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for DeclarchError {
    fn from(err: std::io::Error) -> Self {
        DeclarchError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using `DeclarchError`
pub type Result<T> = std::result::Result<T, DeclarchError>;
