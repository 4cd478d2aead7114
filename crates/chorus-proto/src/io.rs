//! Async frame I/O over a byte stream.
//!
//! Reads the fixed header first, validates it, then reads exactly the
//! payload length it claims. A stream that ends cleanly on a frame boundary
//! yields [`ProtocolError::ConnectionClosed`].

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    Frame, FrameHeader,
    errors::{ProtocolError, Result},
};

/// Read one frame from `reader`.
///
/// Cancel safe only between frames: dropping the future mid-frame leaves the
/// stream desynchronized, so callers that race this against shutdown must
/// discard the stream afterwards.
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = BytesMut::zeroed(FrameHeader::SIZE);
    reader.read_exact(&mut buf[..]).await?;

    let payload_size = FrameHeader::from_bytes(&buf)?.payload_size() as usize;

    if payload_size > 0 {
        buf.resize(FrameHeader::SIZE + payload_size, 0);
        reader.read_exact(&mut buf[FrameHeader::SIZE..]).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::FrameTruncated { expected: payload_size, actual: 0 }
            } else {
                ProtocolError::Io(e.to_string())
            }
        })?;
    }

    Frame::decode(&buf)
}

/// Write one frame to `writer` and flush it.
pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(frame.encoded_len());
    frame.encode(&mut buf)?;

    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(())
}
