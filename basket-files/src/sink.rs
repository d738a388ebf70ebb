use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Content type announced for every download
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Response metadata, known before the first byte is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadHead {
    pub filename: String,
    pub content_type: String,
    /// Declared size from the metadata record. Not a verified length, so
    /// never use it for response framing.
    pub size: u64,
}

impl DownloadHead {
    pub fn new(filename: impl Into<String>, size: u64) -> Self {
        Self {
            filename: filename.into(),
            content_type: OCTET_STREAM.to_string(),
            size,
        }
    }

    /// `Content-Disposition` value: a quoted ASCII fallback plus the
    /// RFC 5987 `filename*` form for the exact name.
    pub fn content_disposition(&self) -> String {
        let fallback: String = self
            .filename
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_ascii() && !c.is_ascii_control() => c,
                _ => '_',
            })
            .collect();

        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(&self.filename, ATTR_CHAR)
        )
    }
}

// RFC 5987 attr-char
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Destination of a download.
///
/// `start` is called exactly once, before the first chunk. An error from
/// either method aborts the download.
#[async_trait]
pub trait DownloadSink: Send {
    async fn start(&mut self, head: DownloadHead) -> io::Result<()>;

    async fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()>;
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub head: Option<DownloadHead>,
    pub body: Vec<u8>,
    pub chunks: usize,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DownloadSink for BufferSink {
    async fn start(&mut self, head: DownloadHead) -> io::Result<()> {
        self.head = Some(head);
        Ok(())
    }

    async fn write_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.head.is_none() {
            return Err(io::Error::other("chunk written before start"));
        }
        self.body.extend_from_slice(&chunk);
        self.chunks += 1;
        Ok(())
    }
}
