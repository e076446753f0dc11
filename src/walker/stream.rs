//! Stream guard handed to the consumer
//!
//! A [`FileStream`] wraps the provider's byte stream and reports back to the
//! owning session when the consumer is done with it. Dropping the guard after
//! a clean read counts the file as streamed; dropping it after a read error
//! hands the operation back to the retry engine.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc::UnboundedSender;

use crate::provider::FileMeta;
use crate::walker::session::Msg;

/// Readable byte stream for a delivered file. The session keeps its
/// admission slot reserved until this guard is dropped.
pub struct FileStream<S> {
    inner: S,
    ticket: Option<Ticket<S>>,
}

struct Ticket<S> {
    rel: String,
    meta: FileMeta,
    path: PathBuf,
    attempt: u32,
    error: Option<io::Error>,
    tx: UnboundedSender<Msg<S>>,
}

impl<S> FileStream<S> {
    pub(crate) fn new(
        inner: S,
        rel: String,
        meta: FileMeta,
        path: PathBuf,
        attempt: u32,
        tx: UnboundedSender<Msg<S>>,
    ) -> Self {
        Self {
            inner,
            ticket: Some(Ticket {
                rel,
                meta,
                path,
                attempt,
                error: None,
                tx,
            }),
        }
    }

    /// Root-relative path of the streamed file.
    pub fn rel_path(&self) -> &str {
        self.ticket.as_ref().map(|t| t.rel.as_str()).unwrap_or("")
    }

    /// Full path of the streamed file.
    pub fn path(&self) -> &Path {
        self.ticket
            .as_ref()
            .map(|t| t.path.as_path())
            .unwrap_or_else(|| Path::new(""))
    }

    /// Metadata from the stat that discovered the file.
    pub fn meta(&self) -> FileMeta {
        self.ticket
            .as_ref()
            .map(|t| t.meta)
            .unwrap_or(FileMeta {
                is_dir: false,
                len: 0,
            })
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for FileStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(Err(e)) => {
                // io::Error is not Clone; keep an equivalent copy so the
                // session can retry with the last observed failure.
                if let Some(ticket) = this.ticket.as_mut() {
                    ticket.error = Some(io::Error::new(e.kind(), e.to_string()));
                }
                Poll::Ready(Err(e))
            }
            other => other,
        }
    }
}

impl<S> Drop for FileStream<S> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let _ = ticket.tx.send(Msg::StreamClosed {
                rel: ticket.rel,
                meta: ticket.meta,
                path: ticket.path,
                attempt: ticket.attempt,
                error: ticket.error,
            });
        }
    }
}

impl<S> fmt::Debug for FileStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStream")
            .field("path", &self.path())
            .field("rel_path", &self.rel_path())
            .finish_non_exhaustive()
    }
}
