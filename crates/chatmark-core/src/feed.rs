//! Streaming feed
//!
//! Producers on other tasks push text chunks; the task that owns the
//! transcript drains them without blocking, in production order.

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::sink::DisplaySink;
use crate::transcript::MarkdownTranscript;

/// Create a connected producer / feed pair
pub fn channel() -> (ChunkProducer, ChunkFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    (
        ChunkProducer {
            tx,
            token: token.clone(),
        },
        ChunkFeed { rx, token },
    )
}

/// Sending half, cloneable across tasks
#[derive(Clone)]
pub struct ChunkProducer {
    tx: mpsc::UnboundedSender<String>,
    token: CancellationToken,
}

impl ChunkProducer {
    /// Queue a chunk; false once the stream was cancelled or the feed dropped
    pub fn send(&self, chunk: impl Into<String>) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        self.tx.send(chunk.into()).is_ok()
    }

    /// Stop the stream; already applied text stays
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when the stream is cancelled from either side
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Outcome of one [`ChunkFeed::drain_into`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStatus {
    /// Chunks appended during this call
    pub applied: usize,
    /// No more chunks will ever arrive
    pub finished: bool,
}

/// Receiving half, owned by whoever owns the transcript
pub struct ChunkFeed {
    rx: mpsc::UnboundedReceiver<String>,
    token: CancellationToken,
}

impl ChunkFeed {
    /// Append every pending chunk to `transcript` without blocking
    ///
    /// Chunks are appended with an empty terminator and are never rolled
    /// back. Rendering is left to the caller.
    pub fn drain_into<S: DisplaySink>(
        &mut self,
        transcript: &mut MarkdownTranscript<S>,
    ) -> FeedStatus {
        let mut status = FeedStatus::default();

        loop {
            match self.rx.try_recv() {
                Ok(chunk) => {
                    transcript.append_with(&chunk, "");
                    status.applied += 1;
                }
                Err(TryRecvError::Empty) => {
                    status.finished = self.token.is_cancelled();
                    break;
                }
                Err(TryRecvError::Disconnected) => {
                    status.finished = true;
                    break;
                }
            }
        }

        if status.applied > 0 || status.finished {
            tracing::trace!(
                applied = status.applied,
                finished = status.finished,
                "drained chunk feed"
            );
        }
        status
    }

    /// Stop the stream from the receiving side
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
