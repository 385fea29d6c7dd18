//! Native messaging frame codec.
//!
//! Each message is a 32-bit length in native byte order followed by that
//! many bytes of UTF-8 JSON. Browsers refuse host-to-browser messages over
//! 1 MiB; inbound frames are capped well above anything a page can send.

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{ClarityError, Result};

/// Largest frame the browser accepts from a host.
pub const MAX_OUTBOUND_FRAME: usize = 1024 * 1024;

/// Largest frame accepted from the browser.
pub const MAX_INBOUND_FRAME: usize = 64 * 1024 * 1024;

/// Read one frame. Returns `None` on a clean end of input between frames.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len = [0u8; 4];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(ClarityError::Stream(format!("failed to read frame length: {e}"))),
    }

    let len = u32::from_ne_bytes(len) as usize;
    if len > MAX_INBOUND_FRAME {
        return Err(ClarityError::Stream(format!(
            "inbound frame of {len} bytes exceeds {MAX_INBOUND_FRAME}"
        )));
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| ClarityError::Stream(format!("truncated frame: {e}")))?;
    Ok(Some(body))
}

/// Serialise `message` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    let body = serde_json::to_vec(message)?;
    if body.len() > MAX_OUTBOUND_FRAME {
        return Err(ClarityError::Stream(format!(
            "outbound frame of {} bytes exceeds {MAX_OUTBOUND_FRAME}",
            body.len()
        )));
    }

    let len = (body.len() as u32).to_ne_bytes();
    let io = |e: std::io::Error| ClarityError::Stream(format!("failed to write frame: {e}"));
    writer.write_all(&len).await.map_err(io)?;
    writer.write_all(&body).await.map_err(io)?;
    writer.flush().await.map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn write_then_read() {
        let mut wire = Vec::new();
        write_frame(&mut wire, &json!({ "type": "GET_STATS" })).await.unwrap();
        write_frame(&mut wire, &json!({ "type": "ACK" })).await.unwrap();

        let mut reader = wire.as_slice();
        let first = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(first, br#"{"type":"GET_STATS"}"#);
        assert!(read_frame(&mut reader).await.unwrap().is_some());
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn length_prefix_is_native_endian() {
        let mut wire = Vec::new();
        write_frame(&mut wire, "hi").await.unwrap();
        assert_eq!(&wire[..4], &4u32.to_ne_bytes());
        assert_eq!(&wire[4..], b"\"hi\"");
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let mut wire = 10u32.to_ne_bytes().to_vec();
        wire.extend_from_slice(b"{}");
        let mut reader = wire.as_slice();
        assert!(read_frame(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn oversized_inbound_rejected() {
        let wire = (MAX_INBOUND_FRAME as u32 + 1).to_ne_bytes();
        let mut reader = &wire[..];
        assert!(read_frame(&mut reader).await.is_err());
    }

    #[tokio::test]
    async fn oversized_outbound_rejected() {
        let big = "x".repeat(MAX_OUTBOUND_FRAME);
        let mut wire = Vec::new();
        assert!(write_frame(&mut wire, &big).await.is_err());
        assert!(wire.is_empty());
    }
}
