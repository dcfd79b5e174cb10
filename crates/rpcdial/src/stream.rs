//! The tunnel-established stream.

use crate::raw::BoxConn;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A connection that passed CONNECT validation.
///
/// From here on the bytes are opaque RPC traffic. Any bytes that arrived
/// together with the proxy's response head are replayed before reading from
/// the socket again. Dropping the stream closes the connection.
pub struct TunnelStream {
    inner: BoxConn,
    pending: Vec<u8>,
    pos: usize,
    endpoint: String,
}

impl TunnelStream {
    pub(crate) fn new(inner: BoxConn, pending: Vec<u8>, endpoint: impl Into<String>) -> Self {
        Self {
            inner,
            pending,
            pos: 0,
            endpoint: endpoint.into(),
        }
    }

    /// Normalized endpoint this tunnel was dialed to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bytes received after the response head and not yet read.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        &self.pending[self.pos..]
    }
}

impl fmt::Debug for TunnelStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelStream")
            .field("endpoint", &self.endpoint)
            .field("buffered", &self.buffered().len())
            .finish_non_exhaustive()
    }
}

impl AsyncRead for TunnelStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.pending.len() {
            let n = buf.remaining().min(this.pending.len() - this.pos);
            buf.put_slice(&this.pending[this.pos..this.pos + n]);
            this.pos += n;
            if this.pos == this.pending.len() {
                this.pending = Vec::new();
                this.pos = 0;
            }
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for TunnelStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
