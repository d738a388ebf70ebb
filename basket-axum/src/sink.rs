use std::io;

use async_trait::async_trait;
use basket_core::{BasketError, BasketResult};
use basket_files::{DownloadHead, DownloadSink};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

/// Chunks buffered between the download task and the response body
pub const DOWNLOAD_BUFFER: usize = 8;

pub type HeadReceiver = oneshot::Receiver<BasketResult<DownloadHead>>;
pub type BodyReceiver = mpsc::Receiver<io::Result<Bytes>>;

/// [`DownloadSink`] feeding an HTTP response from another task.
///
/// The head goes through a oneshot so the handler can answer with a
/// normal error response until `start` is called. Body chunks go through
/// a bounded channel; a dropped receiver (client gone) fails the next
/// write.
///
/// A write succeeds once the chunk is queued, not once the client has
/// read it. The download is therefore counted as soon as the last chunk
/// fits in the channel, even if the client disconnects with up to
/// [`DOWNLOAD_BUFFER`] chunks still pending.
pub struct ChannelSink {
    head: Option<oneshot::Sender<BasketResult<DownloadHead>>>,
    body: mpsc::Sender<io::Result<Bytes>>,
}

impl ChannelSink {
    pub fn channel() -> (Self, HeadReceiver, BodyReceiver) {
        let (head_tx, head_rx) = oneshot::channel();
        let (body_tx, body_rx) = mpsc::channel(DOWNLOAD_BUFFER);
        let sink = Self {
            head: Some(head_tx),
            body: body_tx,
        };
        (sink, head_rx, body_rx)
    }

    /// Deliver the outcome of the download.
    ///
    /// Before the head was sent the error becomes the response. After
    /// that the body is aborted with an I/O error.
    pub async fn finish(mut self, result: BasketResult<()>) {
        let Err(err) = result else {
            return;
        };

        match self.head.take() {
            Some(head) => {
                let _ = head.send(Err(err));
            }
            None => {
                tracing::warn!(error = %err.cause_chain(), "download aborted after response started");
                let _ = self.body.send(Err(io::Error::other(err.message))).await;
            }
        }
    }
}

#[async_trait]
impl DownloadSink for ChannelSink {
    async fn start(&mut self, head: DownloadHead) -> io::Result<()> {
        let sender = self
            .head
            .take()
            .ok_or_else(|| io::Error::other("download already started"))?;
        sender
            .send(Ok(head))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
        self.body
            .send(Ok(chunk))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))
    }
}

/// Fallback when the download task ends without answering.
pub(crate) fn task_ended() -> BasketError {
    BasketError::internal(anyhow::anyhow!("download task ended without a response"))
}
