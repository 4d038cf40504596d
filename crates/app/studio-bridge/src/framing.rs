//! Length-prefixed JSON framing for running the bridge over a byte stream.
//!
//! Each frame is a little-endian `u32` byte count followed by that many bytes
//! of JSON, the same layout browsers use for native messaging.

use anyhow::{Context, Result, bail};
use serde::{Serialize, de::DeserializeOwned};
use studio_bridge_protocol::{InboundFrame, OutboundFrame};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};

use crate::Bridge;

/// Frames larger than this are refused in both directions.
pub const MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

fn check_frame_size(len: usize, direction: &str) -> Result<()> {
    if len == 0 {
        bail!("{direction} frame is empty");
    }
    if len > MAX_FRAME_SIZE {
        bail!("{direction} frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte limit");
    }
    Ok(())
}

/// Reads one frame sent by the host. Returns `Ok(None)` when the host
/// closes the stream between frames.
pub async fn read_framed<R, T>(reader: &mut R) -> Result<Option<T>>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = match reader.read_u32_le().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("reading host frame header"),
    };
    check_frame_size(len, "inbound")?;

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .with_context(|| format!("host frame ended before its {len} declared bytes"))?;

    let frame = serde_json::from_slice(&body).context("host frame is not valid JSON")?;
    Ok(Some(frame))
}

/// Writes one frame for the host and flushes it.
pub async fn write_framed<W, T>(writer: &mut W, frame: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(frame).context("encoding guest frame")?;
    check_frame_size(body.len(), "outbound")?;

    writer
        .write_u32_le(body.len() as u32)
        .await
        .context("writing guest frame header")?;
    writer
        .write_all(&body)
        .await
        .context("writing guest frame body")?;
    writer.flush().await.context("flushing guest frames")?;
    Ok(())
}

/// Pumps frames between a byte stream and `bridge`.
///
/// Inbound [`InboundFrame`]s read from `reader` are fed to
/// [`Bridge::handle_inbound`]; [`OutboundFrame`]s arriving on `outbound`
/// (usually the receiver of the bridge's
/// [`ChannelTransport`](crate::ChannelTransport)) are written to `writer`.
/// Returns when the reader reaches end of stream or either side fails.
pub async fn serve<R, W>(
    bridge: Bridge,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    mut reader: R,
    mut writer: W,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let writer_loop = async {
        tracing::debug!("Frame writer started");
        while let Some(frame) = outbound.recv().await {
            tracing::debug!("Writing {} frame to the host", frame.data.kind());
            write_framed(&mut writer, &frame).await?;
        }
        tracing::debug!("Outbound channel closed, frame writer stopped");
        Ok::<_, anyhow::Error>(())
    };

    let reader_loop = async {
        tracing::debug!("Frame reader started");
        while let Some(frame) = read_framed::<_, InboundFrame>(&mut reader).await? {
            bridge.handle_inbound(&frame.origin, frame.data);
        }
        tracing::info!("Host closed the stream");
        Ok::<_, anyhow::Error>(())
    };

    tokio::select! {
        result = reader_loop => result,
        result = writer_loop => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn frame_layout_is_length_then_json() {
        let mut buf = Vec::new();
        write_framed(&mut buf, &json!({"type": "clearChat"}))
            .await
            .unwrap();

        let body = br#"{"type":"clearChat"}"#;
        assert_eq!(&buf[..4], &(body.len() as u32).to_le_bytes());
        assert_eq!(&buf[4..], body);
    }

    #[tokio::test]
    async fn clean_eof_reads_none() {
        let mut empty: &[u8] = &[];
        let frame: Option<Value> = read_framed(&mut empty).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn zero_length_frame_is_an_error() {
        let mut input: &[u8] = &[0, 0, 0, 0];
        let err = read_framed::<_, Value>(&mut input).await.unwrap_err();
        assert_eq!(err.to_string(), "inbound frame is empty");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_before_reading_body() {
        let len = (MAX_FRAME_SIZE as u32 + 1).to_le_bytes();
        let mut input: &[u8] = &len;
        let err = read_framed::<_, Value>(&mut input).await.unwrap_err();
        assert!(err.to_string().contains("exceeds the"));
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let mut input = 10u32.to_le_bytes().to_vec();
        input.extend_from_slice(b"{}");
        let mut input: &[u8] = &input;
        assert!(read_framed::<_, Value>(&mut input).await.is_err());
    }
}
