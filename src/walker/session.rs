//! Walk session actor
//!
//! One spawned task owns all mutable scheduler state: the pending-operation
//! count (the admission gate), the work queue, the paused flag and the run
//! statistics. I/O runs on short-lived spawned tasks whose completions come
//! back over an internal channel, so every queue and counter mutation happens
//! on this single logical thread of control.
//!
//! The scheduling contract, in short:
//!
//! - every unit of work passes `try_admit` before issuing I/O; admission
//!   failure re-enqueues the item intact (backpressure, never busy-waiting)
//! - every admitted operation releases exactly once, whatever its outcome
//! - a release frees a slot, pulls the next queued item, and fires the
//!   terminal notification when the pending count drains to zero

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::config::WalkConfig;
use crate::error::WalkError;
use crate::events::{Entry, WalkEvent};
use crate::provider::{FileMeta, FsProvider};
use crate::stats::WalkStats;
use crate::walker::queue::{QueueItem, WorkQueue};
use crate::walker::relative_path;
use crate::walker::stream::FileStream;

/// Control requests from the walk handle.
pub(crate) enum Ctrl {
    Pause,
    Resume,
}

/// Completions and deferred actions flowing back into the session loop.
pub(crate) enum Msg<S> {
    StatDone {
        path: PathBuf,
        attempt: u32,
        result: io::Result<FileMeta>,
    },
    ListDone {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        result: io::Result<Vec<String>>,
    },
    OpenDone {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        result: io::Result<S>,
    },
    /// A retry timer expired; re-submit the wrapped item undelayed.
    TimerFired(QueueItem),
    /// Deferred release of a file delivery's admission slot.
    FileFinalized,
    /// The consumer dropped a [`FileStream`].
    StreamClosed {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        error: Option<io::Error>,
    },
}

pub(crate) struct Session<P: FsProvider> {
    root: PathBuf,
    provider: Arc<P>,
    config: WalkConfig,
    stats: Arc<WalkStats>,
    queue: WorkQueue,
    pending: usize,
    paused: bool,
    done: bool,
    tx: UnboundedSender<Msg<P::Stream>>,
    events: UnboundedSender<WalkEvent<P::Stream>>,
}

impl<P: FsProvider> Session<P> {
    pub(crate) fn new(
        root: PathBuf,
        provider: Arc<P>,
        config: WalkConfig,
        stats: Arc<WalkStats>,
        tx: UnboundedSender<Msg<P::Stream>>,
        events: UnboundedSender<WalkEvent<P::Stream>>,
    ) -> Self {
        Self {
            root,
            provider,
            config,
            stats,
            queue: WorkQueue::new(),
            pending: 0,
            paused: false,
            done: false,
            tx,
            events,
        }
    }

    pub(crate) async fn run(
        mut self,
        mut rx: UnboundedReceiver<Msg<P::Stream>>,
        mut ctrl_rx: UnboundedReceiver<Ctrl>,
    ) {
        debug!(root = %self.root.display(), "walk session started");
        self.dispatch(QueueItem::Stat {
            path: self.root.clone(),
            last_err: None,
            attempt: 0,
        });

        let mut ctrl_closed = false;
        while !self.done {
            tokio::select! {
                biased;
                ctrl = ctrl_rx.recv(), if !ctrl_closed => match ctrl {
                    Some(ctrl) => self.handle_ctrl(ctrl),
                    None => {
                        ctrl_closed = true;
                        if self.paused {
                            // Nobody left to resume us.
                            debug!("handle dropped while paused, ending session");
                            break;
                        }
                    }
                },
                msg = rx.recv() => match msg {
                    Some(msg) => self.handle_msg(msg),
                    None => break,
                },
            }
            if self.events.is_closed() {
                debug!("event receiver dropped, abandoning walk");
                break;
            }
        }
    }

    fn handle_ctrl(&mut self, ctrl: Ctrl) {
        match ctrl {
            Ctrl::Pause => {
                debug!("pause requested");
                self.paused = true;
            }
            Ctrl::Resume => self.resume(),
        }
    }

    fn handle_msg(&mut self, msg: Msg<P::Stream>) {
        match msg {
            Msg::StatDone {
                path,
                attempt,
                result,
            } => self.stat_done(path, attempt, result),
            Msg::ListDone {
                rel,
                meta,
                path,
                attempt,
                result,
            } => self.list_done(rel, meta, path, attempt, result),
            Msg::OpenDone {
                rel,
                meta,
                path,
                attempt,
                result,
            } => self.open_done(rel, meta, path, attempt, result),
            Msg::TimerFired(item) => self.timer_fired(item),
            Msg::FileFinalized => self.release(),
            Msg::StreamClosed {
                rel,
                meta,
                path,
                attempt,
                error,
            } => self.stream_closed(rel, meta, path, attempt, error),
        }
    }

    /// One handler per queue variant, selected here and nowhere else.
    fn dispatch(&mut self, item: QueueItem) {
        match item {
            QueueItem::Stat {
                path,
                last_err,
                attempt,
            } => self.stat(path, last_err, attempt),
            QueueItem::ExpandDir {
                rel,
                meta,
                path,
                last_err,
                attempt,
            } => self.expand_dir(rel, meta, path, last_err, attempt),
            QueueItem::DeliverFile { rel, meta, path } => self.deliver_file(rel, meta, path),
            QueueItem::OpenStream {
                rel,
                meta,
                path,
                last_err,
                attempt,
            } => self.open_stream(rel, meta, path, last_err, attempt),
            QueueItem::Delayed { inner, delay } => self.delay(inner, delay),
        }
    }

    // ---- concurrency gate -------------------------------------------------

    /// Reserve one unit of concurrency capacity. Fails without side effects
    /// while paused or when the gate is full.
    fn try_admit(&mut self) -> bool {
        if self.paused {
            return false;
        }
        if self.config.max_pending == 0 || self.pending < self.config.max_pending {
            self.pending += 1;
            return true;
        }
        false
    }

    /// Finalize one admitted operation: free its slot, pull the next queued
    /// item if a slot is available, and fire the terminal notification once
    /// nothing is left in flight.
    fn release(&mut self) {
        debug_assert!(self.pending > 0, "release without matching admission");
        self.pending -= 1;

        if !self.queue.is_empty()
            && (self.config.max_pending == 0 || self.pending < self.config.max_pending)
        {
            self.dequeue();
        }

        if self.pending == 0 {
            if self.paused {
                debug!("in-flight work drained while paused");
                self.emit(WalkEvent::Paused(self.stats.snapshot()));
            } else {
                let snap = self.stats.snapshot();
                info!(
                    dirs = snap.dirs,
                    files = snap.files,
                    bytes = snap.bytes,
                    errors = snap.errors,
                    "walk completed"
                );
                self.emit(WalkEvent::Completed(snap));
                self.done = true;
            }
        }
    }

    /// Pop and dispatch the next deferred operation. No-op while paused.
    fn dequeue(&mut self) {
        if self.paused {
            return;
        }
        if let Some(item) = self.queue.pop() {
            self.dispatch(item);
        }
    }

    fn resume(&mut self) {
        if !self.paused {
            return;
        }
        debug!("resuming");
        self.paused = false;
        if self.queue.is_empty() {
            // Force one admission/release cycle; when nothing is pending
            // this immediately emits the completion notification.
            self.pending += 1;
            self.release();
        } else {
            self.dequeue();
            self.emit(WalkEvent::Resumed);
        }
    }

    // ---- retry engine -----------------------------------------------------

    fn attempts_exhausted(&self, attempt: u32) -> bool {
        matches!(self.config.max_attempts, Some(max) if attempt >= max)
    }

    /// Abort a logical operation permanently: count the error, surface the
    /// last observed failure, finalize. No further events for this path.
    fn give_up(&mut self, last_err: Option<WalkError>, path: &Path, attempt: u32, stream: bool) {
        if stream {
            self.stats.record_stream_error();
        } else {
            self.stats.record_error();
        }
        warn!(path = %path.display(), attempts = attempt, "giving up after repeated failures");
        let err = last_err.unwrap_or_else(|| WalkError::RetriesExhausted {
            path: path.to_path_buf(),
            attempts: attempt,
        });
        self.emit(WalkEvent::Error(err));
        self.release();
    }

    // ---- traversal driver -------------------------------------------------

    fn stat(&mut self, path: PathBuf, last_err: Option<WalkError>, attempt: u32) {
        if !self.try_admit() {
            self.queue.enqueue(QueueItem::Stat {
                path,
                last_err,
                attempt,
            });
            return;
        }
        if self.attempts_exhausted(attempt) {
            self.give_up(last_err, &path, attempt, false);
            return;
        }

        // Freshly discovered path; the root is traversed silently.
        if attempt == 0 && path != self.root {
            self.stats.record_discovered();
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.stat(&path).await;
            let _ = tx.send(Msg::StatDone {
                path,
                attempt,
                result,
            });
        });
    }

    fn stat_done(&mut self, path: PathBuf, attempt: u32, result: io::Result<FileMeta>) {
        match result {
            Err(e) => {
                self.stats.record_retry();
                debug!(path = %path.display(), attempt, error = %e, "stat failed, scheduling retry");
                let last_err = Some(WalkError::Stat {
                    path: path.clone(),
                    source: e,
                });
                self.queue.enqueue_delayed(
                    QueueItem::Stat {
                        path,
                        last_err,
                        attempt: attempt + 1,
                    },
                    self.config.attempt_timeout,
                );
            }
            Ok(meta) => {
                let rel = relative_path(&self.root, &path);
                if meta.is_dir {
                    self.dispatch(QueueItem::ExpandDir {
                        rel,
                        meta,
                        path,
                        last_err: None,
                        attempt: 0,
                    });
                } else if self.config.matches(&path.to_string_lossy()) {
                    self.dispatch(QueueItem::DeliverFile { rel, meta, path });
                }
                // A filtered-out file is finalized without any notification.
            }
        }
        self.release();
    }

    fn expand_dir(
        &mut self,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        last_err: Option<WalkError>,
        attempt: u32,
    ) {
        if !self.try_admit() {
            self.queue.enqueue(QueueItem::ExpandDir {
                rel,
                meta,
                path,
                last_err,
                attempt,
            });
            return;
        }
        if self.attempts_exhausted(attempt) {
            self.give_up(last_err, &path, attempt, false);
            return;
        }

        if attempt == 0 && path != self.root {
            self.stats.record_dir();
            self.emit(WalkEvent::Directory(Entry {
                rel_path: rel.clone(),
                meta,
                path: path.clone(),
            }));
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.read_dir(&path).await;
            let _ = tx.send(Msg::ListDone {
                rel,
                meta,
                path,
                attempt,
                result,
            });
        });
    }

    fn list_done(
        &mut self,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        result: io::Result<Vec<String>>,
    ) {
        match result {
            Err(e) => {
                self.stats.record_retry();
                debug!(path = %path.display(), attempt, error = %e, "listing failed, scheduling retry");
                let last_err = Some(WalkError::ReadDir {
                    path: path.clone(),
                    source: e,
                });
                // Retry re-lists this directory; it is already reported, so
                // the attempt counter keeps the notification from repeating.
                self.queue.enqueue_delayed(
                    QueueItem::ExpandDir {
                        rel,
                        meta,
                        path,
                        last_err,
                        attempt: attempt + 1,
                    },
                    self.config.attempt_timeout,
                );
            }
            Ok(names) => {
                debug!(path = %path.display(), children = names.len(), "expanded directory");
                for name in names {
                    self.dispatch(QueueItem::Stat {
                        path: path.join(name),
                        last_err: None,
                        attempt: 0,
                    });
                }
            }
        }
        self.release();
    }

    fn deliver_file(&mut self, rel: String, meta: FileMeta, path: PathBuf) {
        if !self.try_admit() {
            self.queue.enqueue(QueueItem::DeliverFile { rel, meta, path });
            return;
        }

        self.stats.record_file(meta.len);
        self.emit(WalkEvent::File(Entry {
            rel_path: rel.clone(),
            meta,
            path: path.clone(),
        }));

        if self.config.streams {
            self.dispatch(QueueItem::OpenStream {
                rel,
                meta,
                path,
                last_err: None,
                attempt: 0,
            });
        }

        // Finalize on the next loop turn so one synchronous delivery cannot
        // monopolize the gate.
        let _ = self.tx.send(Msg::FileFinalized);
    }

    fn open_stream(
        &mut self,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        last_err: Option<WalkError>,
        attempt: u32,
    ) {
        if !self.try_admit() {
            self.queue.enqueue(QueueItem::OpenStream {
                rel,
                meta,
                path,
                last_err,
                attempt,
            });
            return;
        }
        if self.attempts_exhausted(attempt) {
            self.give_up(last_err, &path, attempt, true);
            return;
        }

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = provider.open_read_stream(&path).await;
            let _ = tx.send(Msg::OpenDone {
                rel,
                meta,
                path,
                attempt,
                result,
            });
        });
    }

    fn open_done(
        &mut self,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        result: io::Result<P::Stream>,
    ) {
        match result {
            Err(e) => {
                self.stats.record_retry();
                let err = WalkError::StreamOpen {
                    path: path.clone(),
                    source: e,
                };
                if err.is_resource_exhaustion() {
                    // Out of descriptors: wait for a stream to close instead
                    // of counting this as a real failure.
                    self.stats.record_peak_open(self.stats.open_streams());
                    debug!(path = %path.display(), "descriptor limit hit, requeueing stream open");
                    self.queue.enqueue(QueueItem::OpenStream {
                        rel,
                        meta,
                        path,
                        last_err: Some(err),
                        attempt,
                    });
                } else {
                    debug!(path = %path.display(), attempt, "stream open failed, scheduling retry");
                    self.queue.enqueue_delayed(
                        QueueItem::OpenStream {
                            rel,
                            meta,
                            path,
                            last_err: Some(err),
                            attempt: attempt + 1,
                        },
                        self.config.attempt_timeout,
                    );
                }
                self.release();
            }
            Ok(stream) => {
                self.stats.record_stream_open();
                let entry = Entry {
                    rel_path: rel.clone(),
                    meta,
                    path: path.clone(),
                };
                let stream = FileStream::new(stream, rel, meta, path, attempt, self.tx.clone());
                self.emit(WalkEvent::Stream { stream, entry });
                // The admission slot stays reserved until the consumer drops
                // the stream; its Drop reports back as Msg::StreamClosed.
            }
        }
    }

    fn stream_closed(
        &mut self,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        error: Option<io::Error>,
    ) {
        self.stats.record_stream_close();
        match error {
            None => self.stats.record_streamed(),
            Some(e) => {
                self.stats.record_retry();
                debug!(path = %path.display(), attempt, error = %e, "stream errored, scheduling retry");
                let last_err = Some(WalkError::StreamRead {
                    path: path.clone(),
                    source: e,
                });
                self.queue.enqueue_delayed(
                    QueueItem::OpenStream {
                        rel,
                        meta,
                        path,
                        last_err,
                        attempt: attempt + 1,
                    },
                    self.config.attempt_timeout,
                );
            }
        }
        self.release();
    }

    /// Admit the delayed-requeue record itself, then schedule its timer. The
    /// timer only re-submits the wrapped item; it never runs I/O.
    fn delay(&mut self, inner: Box<QueueItem>, delay: Duration) {
        if !self.try_admit() {
            self.queue.enqueue(QueueItem::Delayed { inner, delay });
            return;
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Msg::TimerFired(*inner));
        });
    }

    fn timer_fired(&mut self, item: QueueItem) {
        self.queue.enqueue(item);
        self.release();
    }

    fn emit(&self, event: WalkEvent<P::Stream>) {
        // A dropped receiver is detected in the run loop; sends may fail
        // silently here.
        let _ = self.events.send(event);
    }
}
