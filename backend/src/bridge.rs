//
// Kornilios Kourtis <kkourt@kkourt.io>
//
// vim: set expandtab softtabstop=4 tabstop=4 shiftwidth=4:
//

//! Transport bridge: adapts one bidirectional channel into a read-only stream (what arrives on
//! the channel) and a write-only stream (what should be sent on the channel), so that a
//! terminal can be attached to a network channel.
//!
//! Each direction is a forwarding task with a fixed-size buffer. A task stops on its first read
//! or write error, without retrying and without touching the other direction. It does fire the
//! session's cancellation token, which is how a disconnect reaches the input loop.

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const BRIDGE_BUF: usize = 1024;

/// Read side: mirrors the data arriving on the channel
#[derive(Debug)]
pub struct BridgeReader(DuplexStream);

/// Write side: everything written here is forwarded onto the channel
#[derive(Debug)]
pub struct BridgeWriter(DuplexStream);

/// The two forwarding tasks of a bridge
pub struct BridgeLegs {
    inbound: JoinHandle<()>,
    outbound: JoinHandle<()>,
}

/// Build a bridge over `channel`. `cancel` is fired when either direction stops.
pub fn bridge<C>(channel: C, cancel: CancellationToken) -> (BridgeReader, BridgeWriter, BridgeLegs)
where
    C: AsyncRead + AsyncWrite + Send + 'static,
{
    let (chan_rd, chan_wr) = tokio::io::split(channel);
    let (reader, inbound_pipe) = tokio::io::duplex(BRIDGE_BUF);
    let (writer, outbound_pipe) = tokio::io::duplex(BRIDGE_BUF);

    let inbound = tokio::spawn(forward(chan_rd, inbound_pipe, "channel -> terminal", cancel.clone()));
    let outbound = tokio::spawn(forward(outbound_pipe, chan_wr, "terminal -> channel", cancel));

    (BridgeReader(reader), BridgeWriter(writer), BridgeLegs { inbound, outbound })
}

async fn forward<R, W>(mut from: R, mut to: W, leg: &'static str, cancel: CancellationToken)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; BRIDGE_BUF];
    loop {
        let n = match from.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                log::debug!("{}: read stopped: {}", leg, e);
                break;
            }
        };
        if let Err(e) = to.write_all(&buf[..n]).await {
            log::debug!("{}: write stopped: {}", leg, e);
            break;
        }
        if to.flush().await.is_err() {
            break;
        }
    }
    let _ = to.shutdown().await;
    log::debug!("{}: stopped", leg);
    cancel.cancel();
}

impl BridgeLegs {
    /// Tear the bridge down once the session is done with it.
    ///
    /// The writer must already be dropped: whatever it queued is flushed to the channel before
    /// the channel is released. The inbound direction is aborted, since it would otherwise wait
    /// for the peer.
    pub async fn finish(self) {
        if let Err(e) = self.outbound.await {
            log::debug!("outbound bridge leg: {}", e);
        }
        self.inbound.abort();
        let _ = self.inbound.await;
    }
}

impl AsyncRead for BridgeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for BridgeWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.0).poll_shutdown(cx)
    }
}
