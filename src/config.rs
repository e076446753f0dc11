//! Walker configuration
//!
//! All options are fixed at construction time; a running session never
//! consults anything mutable besides its own scheduler state.

use regex::Regex;
use std::time::Duration;

/// Default retry ceiling per logical operation.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay before a failed operation is retried.
const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Configuration for a walk session.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Ceiling on simultaneous in-flight I/O operations. `0` means unbounded.
    pub max_pending: usize,

    /// Retry attempts per logical operation. `None` retries indefinitely.
    pub max_attempts: Option<u32>,

    /// Delay before a failed operation is re-queued.
    pub attempt_timeout: Duration,

    /// Optional filter matched against full file paths. Directories are
    /// never filtered.
    pub match_pattern: Option<Regex>,

    /// Open a readable stream for every delivered file and emit it as a
    /// `Stream` event. Decided once here, never inspected per file.
    pub streams: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_pending: 0,
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            match_pattern: None,
            streams: false,
        }
    }
}

impl WalkConfig {
    /// Configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of in-flight I/O operations. `0` removes the bound.
    pub fn max_pending(mut self, max: usize) -> Self {
        self.max_pending = max;
        self
    }

    /// Set the retry ceiling. `None` retries indefinitely.
    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the delay before a failed operation is retried.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Only deliver files whose full path matches `pattern`.
    pub fn match_pattern(mut self, pattern: Regex) -> Self {
        self.match_pattern = Some(pattern);
        self
    }

    /// Also open and emit a readable stream for every delivered file.
    pub fn streams(mut self, enabled: bool) -> Self {
        self.streams = enabled;
        self
    }

    /// Check whether a file path passes the optional filter.
    pub(crate) fn matches(&self, path: &str) -> bool {
        match &self.match_pattern {
            Some(re) => re.is_match(path),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WalkConfig::default();
        assert_eq!(config.max_pending, 0);
        assert_eq!(config.max_attempts, Some(3));
        assert_eq!(config.attempt_timeout, Duration::from_millis(5000));
        assert!(config.match_pattern.is_none());
        assert!(!config.streams);
    }

    #[test]
    fn test_builder_chain() {
        let config = WalkConfig::new()
            .max_pending(8)
            .max_attempts(None)
            .attempt_timeout(Duration::from_millis(50))
            .streams(true);
        assert_eq!(config.max_pending, 8);
        assert_eq!(config.max_attempts, None);
        assert_eq!(config.attempt_timeout, Duration::from_millis(50));
        assert!(config.streams);
    }

    #[test]
    fn test_match_pattern() {
        let config = WalkConfig::new().match_pattern(Regex::new(r"\.txt$").unwrap());
        assert!(config.matches("/data/notes.txt"));
        assert!(!config.matches("/data/image.png"));

        let unfiltered = WalkConfig::new();
        assert!(unfiltered.matches("/anything/at/all"));
    }
}
