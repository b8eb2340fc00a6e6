use std::path::PathBuf;
use thiserror::Error;

/// Fatal gate failures. Each one ends the run with exit code 1.
#[derive(Debug, Error, PartialEq)]
pub enum LaunchError {
    #[error("no Python interpreter found (tried: {})", .tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    #[error("no package manager found (tried: {})", .tried.join(", "))]
    PackageManagerNotFound { tried: Vec<String> },

    #[error(
        "failed to install dependencies from {} (exit code: {})",
        .manifest.display(),
        .code.map_or("signal".to_string(), |c| c.to_string())
    )]
    InstallationFailed {
        manifest: PathBuf,
        code: Option<i32>,
    },
}
