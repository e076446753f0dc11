//! Deferred-operation work queue
//!
//! FIFO backlog of traversal steps that could not be admitted immediately,
//! plus the delayed-requeue records produced by the retry engine. The queue
//! is privately owned by one session and consumed one item at a time as
//! admission slots free up.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::WalkError;
use crate::provider::FileMeta;

/// One deferred step of traversal. Non-delayed variants carry the attempt
/// counter for their logical operation; the counter travels with the item
/// across requeues and is never shared between paths.
#[derive(Debug)]
pub(crate) enum QueueItem {
    /// Stat a path and classify it.
    Stat {
        path: PathBuf,
        last_err: Option<WalkError>,
        attempt: u32,
    },

    /// List a directory's children and recurse into them.
    ExpandDir {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        last_err: Option<WalkError>,
        attempt: u32,
    },

    /// Report a file that passed the filter.
    DeliverFile {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
    },

    /// Open a readable stream for a delivered file.
    OpenStream {
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        last_err: Option<WalkError>,
        attempt: u32,
    },

    /// Re-submit `inner` after `delay`. Scheduling the timer counts as a unit
    /// of work and passes admission like everything else.
    Delayed {
        inner: Box<QueueItem>,
        delay: Duration,
    },
}

/// FIFO backlog of deferred operations.
#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    items: VecDeque<QueueItem>,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push an item for immediate (in-order) consumption.
    pub(crate) fn enqueue(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    /// Push an item to be re-submitted after `delay`. A zero delay enqueues
    /// the item directly.
    pub(crate) fn enqueue_delayed(&mut self, item: QueueItem, delay: Duration) {
        if delay.is_zero() {
            self.items.push_back(item);
        } else {
            self.items.push_back(QueueItem::Delayed {
                inner: Box::new(item),
                delay,
            });
        }
    }

    pub(crate) fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_item(path: &str) -> QueueItem {
        QueueItem::Stat {
            path: PathBuf::from(path),
            last_err: None,
            attempt: 0,
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = WorkQueue::new();
        queue.enqueue(stat_item("/a"));
        queue.enqueue(stat_item("/b"));

        match queue.pop() {
            Some(QueueItem::Stat { path, .. }) => assert_eq!(path, PathBuf::from("/a")),
            other => panic!("unexpected item: {other:?}"),
        }
        match queue.pop() {
            Some(QueueItem::Stat { path, .. }) => assert_eq!(path, PathBuf::from("/b")),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_delay_wraps_item() {
        let mut queue = WorkQueue::new();
        queue.enqueue_delayed(stat_item("/a"), Duration::from_millis(100));

        match queue.pop() {
            Some(QueueItem::Delayed { inner, delay }) => {
                assert_eq!(delay, Duration::from_millis(100));
                assert!(matches!(*inner, QueueItem::Stat { .. }));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn test_zero_delay_is_direct() {
        let mut queue = WorkQueue::new();
        queue.enqueue_delayed(stat_item("/a"), Duration::ZERO);
        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.pop(), Some(QueueItem::Stat { .. })));
    }
}
