use std::io;

use basket_blob::ByteStream;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Turn a reader into a [`ByteStream`] of chunks of at most `chunk_size`
/// bytes. A zero-length read ends the stream; a read error is yielded once
/// and ends it too.
pub fn read_chunks<R>(mut reader: R, chunk_size: usize) -> ByteStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    let chunk_size = chunk_size.max(1);
    Box::pin(async_stream::stream! {
        let mut buffer = vec![0u8; chunk_size];
        loop {
            match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => yield Ok::<Bytes, io::Error>(Bytes::copy_from_slice(&buffer[..n])),
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    struct Broken;

    impl AsyncRead for Broken {
        fn poll_read(self: Pin<&mut Self>, _: &mut Context<'_>, _: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn splits_into_bounded_chunks() {
        let data: Vec<u8> = (0..10u8).collect();
        let mut stream = read_chunks(io::Cursor::new(data.clone()), 4);

        let mut sizes = Vec::new();
        let mut joined = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            sizes.push(chunk.len());
            joined.extend_from_slice(&chunk);
        }

        assert!(sizes.iter().all(|n| *n > 0 && *n <= 4));
        assert_eq!(joined, data);
    }

    #[tokio::test]
    async fn empty_reader_yields_nothing() {
        let mut stream = read_chunks(io::Cursor::new(Vec::new()), 4);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn read_error_is_yielded() {
        let mut stream = read_chunks(Broken, 4);
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "disk gone");
        assert!(stream.next().await.is_none());
    }
}
