use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a fetch-flatten-write run.
///
/// Columns that cannot be expanded as nested objects are not errors: the
/// flattener coerces them to strings and carries on.
#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint answered with a non-success status.
    #[error("HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    /// The request never produced a response (DNS, connect, TLS, bad URL).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Http { .. } => 3,
            Error::Transport(_) => 4,
            Error::Parse(_) => 5,
            Error::Io { .. } | Error::Csv(_) => 6,
        }
    }
}
