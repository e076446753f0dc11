//! Notifications delivered to the consumer
//!
//! Events arrive over the receiver returned by [`crate::Walker::walk`], in
//! the order the traversal produced them. Ordering is only guaranteed within
//! one directory's processing pipeline; sibling subtrees interleave freely
//! (bounded by the admission gate).

use std::path::PathBuf;

use crate::error::WalkError;
use crate::provider::FileMeta;
use crate::stats::StatsSnapshot;
use crate::walker::stream::FileStream;

/// One discovered path: its root-relative identifier, metadata and full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Root-relative, forward-slash-separated. Empty for the root itself.
    pub rel_path: String,
    /// Metadata from the stat that discovered this entry.
    pub meta: FileMeta,
    /// Absolute path as handed to the provider.
    pub path: PathBuf,
}

/// A notification from a running walk session.
#[derive(Debug)]
pub enum WalkEvent<S> {
    /// A descendant directory was discovered. Never emitted for the root.
    Directory(Entry),

    /// A file passed the filter and was delivered.
    File(Entry),

    /// A readable stream was opened for a delivered file. The consumer owns
    /// the stream; dropping it (read to the end or not) lets the session
    /// finalize the operation. Only emitted when `WalkConfig::streams` is set.
    Stream {
        stream: FileStream<S>,
        entry: Entry,
    },

    /// An operation exhausted its retries; carries the last observed failure.
    /// The traversal continues past the failed path.
    Error(WalkError),

    /// All admitted and queued work drained while paused. Terminal until
    /// `resume()` is called.
    Paused(StatsSnapshot),

    /// Traversal resumed with work still outstanding.
    Resumed,

    /// Every admitted and queued operation has finalized. Always the last
    /// event of a session.
    Completed(StatsSnapshot),
}

impl<S> WalkEvent<S> {
    /// True for the two terminal notifications, `Paused` and `Completed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkEvent::Paused(_) | WalkEvent::Completed(_))
    }
}
