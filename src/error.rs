//! Crate-wide error type.

use std::io;
use std::path::PathBuf;

/// Errors raised while loading problems, configuring walkers, running the
/// pool or writing reports.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no problem to process: supply a point file or a polygon size")]
    NoProblem,

    #[error("problem has no points")]
    EmptyProblem,

    #[error("{}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}: {content:?}")]
    Parse {
        line: usize,
        content: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown move class {0:?} (expected \"reverse\" or \"swap\")")]
    UnknownMoveClass(String),

    #[error("unknown cooling schedule {0:?} (expected \"standard\" or \"adaptive\")")]
    UnknownSchedule(String),

    #[error("walkers exited early: received {received} of {expected} packets")]
    WalkerLost { expected: usize, received: usize },

    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "data/missing.csv",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        let msg = err.to_string();
        assert_eq!(msg, "data/missing.csv");

        // the cause is reported once, through the source chain
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("not found"));
    }

    #[test]
    fn test_parse_error_quotes_line() {
        let err = Error::Parse {
            line: 3,
            content: "b,1.0,oops".into(),
            reason: "invalid y coordinate".into(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("line 3"));
        assert!(msg.contains("b,1.0,oops"));
    }
}
