//! Length-prefixed framing used by the NIS protocol.
//!
//! Every frame is a 2-byte big-endian length followed by that many bytes:
//! `[u16 length][payload]`. A request is a single frame. A response is a
//! sequence of frames ended by a zero-length frame; there is no total-length
//! header, so the terminator is the only signal that the report is complete.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::FrameError;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Encode a command as one frame.
pub fn encode_frame(command: &str) -> Result<Vec<u8>, FrameError> {
    let len = u16::try_from(command.len()).map_err(|_| FrameError::CommandTooLong(command.len()))?;

    let mut frame = Vec::with_capacity(2 + command.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(command.as_bytes());
    Ok(frame)
}

/// Write a command as one frame and flush the writer.
///
/// Returns the number of bytes put on the wire, prefix included.
pub async fn write_frame<W>(writer: &mut W, command: &str) -> Result<usize, FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(command)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(frame.len())
}

/// Read frames until the zero-length terminator and return the joined body.
///
/// Chunk boundaries carry no meaning; the payloads are concatenated in order.
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub async fn read_response<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();

    loop {
        let len = read_prefix(reader).await?;
        if len == 0 {
            break;
        }

        let start = body.len();
        body.resize(start + len, 0);
        read_chunk(reader, &mut body[start..]).await?;
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

async fn read_prefix<R>(reader: &mut R) -> Result<usize, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; 2];
    let mut filled = 0;

    while filled < prefix.len() {
        match reader.read(&mut prefix[filled..]).await? {
            0 => return Err(FrameError::TruncatedPrefix),
            n => filled += n,
        }
    }

    Ok(u16::from_be_bytes(prefix) as usize)
}

async fn read_chunk<R>(reader: &mut R, chunk: &mut [u8]) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut received = 0;

    while received < chunk.len() {
        match reader.read(&mut chunk[received..]).await? {
            0 => {
                return Err(FrameError::TruncatedChunk {
                    expected: chunk.len(),
                    received,
                })
            }
            n => received += n,
        }
    }

    Ok(())
}
