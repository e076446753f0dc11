//! Run statistics
//!
//! Counters are only ever mutated from inside the session's dispatch loop;
//! consumers read them through [`StatsSnapshot`]. Atomics let the handle take
//! a snapshot at any time without locking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one walk session.
#[derive(Debug, Default)]
pub struct WalkStats {
    dirs: AtomicU64,
    files: AtomicU64,
    bytes: AtomicU64,
    discovered: AtomicU64,
    errors: AtomicU64,
    retry_attempts: AtomicU64,
    streamed: AtomicU64,
    stream_errors: AtomicU64,
    open_streams: AtomicU64,
    peak_open_streams: AtomicU64,
}

impl WalkStats {
    pub(crate) fn record_dir(&self) {
        self.dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_file(&self, bytes: u64) {
        self.files.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retry_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_streamed(&self) {
        self.streamed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stream_error(&self) {
        self.stream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stream_open(&self) {
        self.open_streams.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stream_close(&self) {
        self.open_streams.fetch_sub(1, Ordering::Relaxed);
    }

    /// Number of streams currently held by the consumer.
    pub(crate) fn open_streams(&self) -> u64 {
        self.open_streams.load(Ordering::Relaxed)
    }

    /// Raise the peak-open-streams watermark. Only updated when the walker
    /// observes descriptor exhaustion, so it records the highest count the
    /// platform actually sustained. Stored shifted by one so that zero means
    /// the limit was never hit.
    pub(crate) fn record_peak_open(&self, open: u64) {
        self.peak_open_streams.fetch_max(open + 1, Ordering::Relaxed);
    }

    pub(crate) fn reset(&self) {
        self.dirs.store(0, Ordering::Relaxed);
        self.files.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
        self.discovered.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.retry_attempts.store(0, Ordering::Relaxed);
        self.streamed.store(0, Ordering::Relaxed);
        self.stream_errors.store(0, Ordering::Relaxed);
        self.open_streams.store(0, Ordering::Relaxed);
        self.peak_open_streams.store(0, Ordering::Relaxed);
    }

    /// Read-only copy of the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dirs: self.dirs.load(Ordering::Relaxed),
            files: self.files.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            discovered: self.discovered.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            retry_attempts: self.retry_attempts.load(Ordering::Relaxed),
            streamed: self.streamed.load(Ordering::Relaxed),
            stream_errors: self.stream_errors.load(Ordering::Relaxed),
            open_streams: self.open_streams.load(Ordering::Relaxed),
            peak_open_streams: self
                .peak_open_streams
                .load(Ordering::Relaxed)
                .checked_sub(1),
        }
    }
}

/// Plain-data view of [`WalkStats`] at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Directories reported (the root is excluded).
    pub dirs: u64,
    /// Files reported (after filtering).
    pub files: u64,
    /// Accumulated size of reported files.
    pub bytes: u64,
    /// Entries discovered below the root, whether or not they were reported.
    pub discovered: u64,
    /// Stat/listing operations that permanently failed.
    pub errors: u64,
    /// Individual failed attempts, including those that were later retried.
    pub retry_attempts: u64,
    /// Streams consumed to a clean close.
    pub streamed: u64,
    /// Stream operations that permanently failed.
    pub stream_errors: u64,
    /// Streams currently held by the consumer.
    pub open_streams: u64,
    /// Highest open-stream count observed when hitting the descriptor limit,
    /// or `None` if the limit was never hit.
    pub peak_open_streams: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let stats = WalkStats::default();
        stats.record_dir();
        stats.record_file(512);
        stats.record_file(512);
        stats.record_discovered();
        stats.record_retry();

        let snap = stats.snapshot();
        assert_eq!(snap.dirs, 1);
        assert_eq!(snap.files, 2);
        assert_eq!(snap.bytes, 1024);
        assert_eq!(snap.discovered, 1);
        assert_eq!(snap.retry_attempts, 1);
        assert_eq!(snap.errors, 0);
    }

    #[test]
    fn test_peak_open_watermark() {
        let stats = WalkStats::default();
        // Never-observed is distinct from observed-at-zero.
        assert_eq!(stats.snapshot().peak_open_streams, None);
        stats.record_peak_open(0);
        assert_eq!(stats.snapshot().peak_open_streams, Some(0));
        stats.record_peak_open(4);
        stats.record_peak_open(2);
        assert_eq!(stats.snapshot().peak_open_streams, Some(4));
    }

    #[test]
    fn test_reset() {
        let stats = WalkStats::default();
        stats.record_dir();
        stats.record_file(10);
        stats.reset();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }
}
