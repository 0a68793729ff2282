//! Error types for configuring and running a migration.

use std::path::PathBuf;

use thiserror::Error;

/// The prefix and direction options contradict each other.
///
/// Detected before the library is opened.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("--from and --to must be given together")]
    UnpairedPrefix,

    #[error(
        "--from {from:?} and --to {to:?} must both end with a path separator, or neither must"
    )]
    TrailingSeparatorMismatch { from: String, to: String },

    #[error("--to-windows needs a Unix --from prefix starting with '/', got {0:?}")]
    ExpectedUnixSource(String),

    #[error("--to-windows needs a Windows --to prefix such as 'P:\\', got {0:?}")]
    ExpectedWindowsTarget(String),

    #[error("--to-unix needs a Windows --from prefix such as 'P:\\', got {0:?}")]
    ExpectedWindowsSource(String),

    #[error("--to-unix needs a Unix --to prefix starting with '/', got {0:?}")]
    ExpectedUnixTarget(String),
}

/// Anything that stops a migration run.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot open library {}: {source}", path.display())]
    StorageOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("library {} is read-only, check its file permissions", path.display())]
    ReadOnly { path: PathBuf },

    #[error("{} is not a photo library: it has no {table} table", path.display())]
    MissingTable { path: PathBuf, table: &'static str },

    #[error("failed to read film rolls: {0}")]
    StorageRead(#[source] rusqlite::Error),

    #[error(
        "failed to update film roll {id}: {source} \
         ({applied} entries migrated before the failure)"
    )]
    StorageWrite {
        id: i64,
        applied: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("migration transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),

    #[error("failed to back up library to {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to encode migration report: {0}")]
    ReportEncode(#[from] serde_json::Error),

    #[error("failed to write migration report {}: {source}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MigrateError {
    /// Map error to a process exit code (see sysexits.h).
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) => 78, // EX_CONFIG
            MigrateError::StorageOpen { .. }
            | MigrateError::ReadOnly { .. }
            | MigrateError::MissingTable { .. } => 66, // EX_NOINPUT
            MigrateError::StorageRead(_)
            | MigrateError::StorageWrite { .. }
            | MigrateError::Transaction(_) => 74, // EX_IOERR
            MigrateError::Backup { .. }
            | MigrateError::ReportEncode(_)
            | MigrateError::ReportWrite { .. } => 73, // EX_CANTCREAT
        }
    }
}
