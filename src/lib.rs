//! fs-walker - Concurrency-Bounded Recursive Filesystem Walker
//!
//! An asynchronous walker that discovers every descendant directory and file
//! under a root path, reporting each through an event stream while bounding
//! the number of in-flight I/O operations, retrying transient failures with
//! backoff, and supporting cooperative pause/resume.
//!
//! # Features
//!
//! - **Bounded concurrency**: an admission gate caps simultaneous I/O; work
//!   that cannot start is re-queued, never dropped and never busy-waited.
//!
//! - **Retry with backoff**: every stat, listing and stream-open is wrapped
//!   in a bounded-attempts state machine. Only permanent exhaustion surfaces
//!   to the consumer; one bad path never aborts the traversal.
//!
//! - **Pause/resume**: pausing blocks new admissions while in-flight work
//!   drains; resuming re-activates the queue or synthesizes completion.
//!
//! - **Pluggable backend**: all filesystem access goes through the
//!   [`FsProvider`] trait. [`TokioFs`] walks the real filesystem; [`MemFs`]
//!   is an in-memory double for tests.
//!
//! # Example
//!
//! ```no_run
//! use fs_walker::{Walker, WalkEvent};
//!
//! # async fn demo() {
//! let (handle, mut events) = Walker::local("/data").walk();
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         WalkEvent::Directory(entry) => println!("dir  {}", entry.rel_path),
//!         WalkEvent::File(entry) => println!("file {} ({} bytes)", entry.rel_path, entry.meta.len),
//!         WalkEvent::Error(err) => eprintln!("skipped: {err}"),
//!         WalkEvent::Completed(stats) => {
//!             println!("{} dirs, {} files, {} bytes", stats.dirs, stats.files, stats.bytes);
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # let _ = handle;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod memfs;
pub mod provider;
pub mod stats;
pub mod walker;

pub use config::WalkConfig;
pub use error::{Result, WalkError};
pub use events::{Entry, WalkEvent};
pub use memfs::MemFs;
pub use provider::{FileMeta, FsProvider, TokioFs};
pub use stats::StatsSnapshot;
pub use walker::{FileStream, WalkHandle, Walker};
