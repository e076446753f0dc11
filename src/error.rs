//! Error types for fs-walker
//!
//! Every failure the walker can observe is tied to a concrete path and the
//! underlying I/O error. Failures never abort the traversal synchronously:
//! they flow through the retry engine, and only permanent exhaustion surfaces
//! to the consumer as a `WalkEvent::Error`.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failure observed while walking.
#[derive(Error, Debug)]
pub enum WalkError {
    /// Path metadata was unreadable (permission denied, vanished, I/O error).
    #[error("failed to stat '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory could not be listed after being identified as a directory.
    #[error("failed to list directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A readable stream could not be opened for a delivered file.
    #[error("failed to open stream for '{path}': {source}")]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stream errored while the consumer was reading it.
    #[error("stream read failed for '{path}': {source}")]
    StreamRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An operation hit its attempt ceiling without ever recording a failure.
    /// Only reachable with `max_attempts == Some(0)`.
    #[error("gave up on '{path}' after {attempts} attempts")]
    RetriesExhausted { path: PathBuf, attempts: u32 },
}

impl WalkError {
    /// The path this failure is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            WalkError::Stat { path, .. }
            | WalkError::ReadDir { path, .. }
            | WalkError::StreamOpen { path, .. }
            | WalkError::StreamRead { path, .. }
            | WalkError::RetriesExhausted { path, .. } => path,
        }
    }

    /// True if this is a stream-open failure caused by running out of file
    /// descriptors. Such failures are requeued immediately without counting
    /// an attempt: the walker only needs to wait for a descriptor to free up.
    pub fn is_resource_exhaustion(&self) -> bool {
        match self {
            WalkError::StreamOpen { source, .. } => is_descriptor_exhaustion(source),
            _ => false,
        }
    }
}

/// Check the platform error code for the descriptor-limit condition.
#[cfg(unix)]
pub(crate) fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    matches!(err.raw_os_error(), Some(libc::EMFILE) | Some(libc::ENFILE))
}

/// ERROR_TOO_MANY_OPEN_FILES
#[cfg(windows)]
pub(crate) fn is_descriptor_exhaustion(err: &io::Error) -> bool {
    err.raw_os_error() == Some(4)
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn is_descriptor_exhaustion(_err: &io::Error) -> bool {
    false
}

/// Result type alias for WalkError
pub type Result<T> = std::result::Result<T, WalkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_path() {
        let err = WalkError::Stat {
            path: PathBuf::from("/data/file"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.path(), &PathBuf::from("/data/file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exhaustion_classification() {
        let emfile = WalkError::StreamOpen {
            path: PathBuf::from("/f"),
            source: io::Error::from_raw_os_error(libc::EMFILE),
        };
        assert!(emfile.is_resource_exhaustion());

        let denied = WalkError::StreamOpen {
            path: PathBuf::from("/f"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!denied.is_resource_exhaustion());

        // Only stream-open failures qualify, never stat failures.
        let stat = WalkError::Stat {
            path: PathBuf::from("/f"),
            source: io::Error::from_raw_os_error(libc::EMFILE),
        };
        assert!(!stat.is_resource_exhaustion());
    }
}
