//! Recursive traversal engine
//!
//! # Architecture
//!
//! ```text
//!  Walker::walk()
//!        │
//!        ▼
//!  ┌──────────────────────────────────────────────┐
//!  │              Session (one task)              │
//!  │  pending count ── admission gate             │
//!  │  work queue ──── deferred operations (FIFO)  │
//!  │  retry engine ── per-item attempt counters   │
//!  └───────┬──────────────────────────▲───────────┘
//!          │ spawn                    │ completions (mpsc)
//!          ▼                          │
//!   stat / read_dir / open ───────────┘
//!          (FsProvider)
//! ```
//!
//! Consumers receive [`WalkEvent`]s over the channel returned by
//! [`Walker::walk`] and steer the session through the [`WalkHandle`].

pub(crate) mod queue;
pub(crate) mod session;
pub(crate) mod stream;

pub use stream::FileStream;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::WalkConfig;
use crate::events::WalkEvent;
use crate::provider::{FsProvider, TokioFs};
use crate::stats::{StatsSnapshot, WalkStats};
use session::{Ctrl, Session};

/// Root-relative, forward-slash-separated identifier for a path. The root
/// itself maps to the empty string.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

/// A configured walker, ready to traverse one root.
pub struct Walker<P: FsProvider> {
    root: PathBuf,
    provider: Arc<P>,
    config: WalkConfig,
    stats: Arc<WalkStats>,
}

impl<P: FsProvider> Walker<P> {
    /// Walker with default configuration.
    pub fn new(root: impl Into<PathBuf>, provider: P) -> Self {
        Self::with_config(root, provider, WalkConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, provider: P, config: WalkConfig) -> Self {
        Self {
            root: root.into(),
            provider: Arc::new(provider),
            config,
            stats: Arc::new(WalkStats::default()),
        }
    }

    /// The root this walker will traverse.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start the traversal. Consuming the walker makes the session
    /// single-shot by construction.
    ///
    /// Must be called from within a tokio runtime. Events arrive on the
    /// returned receiver; the final event is always `Completed` (or `Paused`
    /// if the session is paused and left to drain).
    pub fn walk(self) -> (WalkHandle, UnboundedReceiver<WalkEvent<P::Stream>>) {
        self.stats.reset();

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();

        let session = Session::new(
            self.root,
            self.provider,
            self.config,
            Arc::clone(&self.stats),
            msg_tx,
            events_tx,
        );
        tokio::spawn(session.run(msg_rx, ctrl_rx));

        (
            WalkHandle {
                ctrl: ctrl_tx,
                stats: self.stats,
            },
            events_rx,
        )
    }
}

impl Walker<TokioFs> {
    /// Walker over the local filesystem.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::new(root, TokioFs)
    }

    pub fn local_with_config(root: impl Into<PathBuf>, config: WalkConfig) -> Self {
        Self::with_config(root, TokioFs, config)
    }
}

/// Handle to a running walk session.
#[derive(Clone)]
pub struct WalkHandle {
    ctrl: UnboundedSender<Ctrl>,
    stats: Arc<WalkStats>,
}

impl WalkHandle {
    /// Stop admitting new work. In-flight operations drain; a `Paused` event
    /// fires once the last one finalizes.
    pub fn pause(&self) {
        let _ = self.ctrl.send(Ctrl::Pause);
    }

    /// Re-activate the queue. Emits `Resumed` when work remains, or goes
    /// straight to `Completed` when the queue drained while paused.
    pub fn resume(&self) {
        let _ = self.ctrl.send(Ctrl::Resume);
    }

    /// Snapshot of the session's counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        let root = Path::new("/data/scan");
        assert_eq!(relative_path(root, Path::new("/data/scan")), "");
        assert_eq!(relative_path(root, Path::new("/data/scan/a")), "a");
        assert_eq!(
            relative_path(root, Path::new("/data/scan/a/b/c.txt")),
            "a/b/c.txt"
        );
    }

    #[test]
    fn test_relative_path_outside_root() {
        // Paths outside the root fall back to their own components.
        let root = Path::new("/data/scan");
        assert_eq!(relative_path(root, Path::new("other/x")), "other/x");
    }
}
