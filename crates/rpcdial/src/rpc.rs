//! Handing an established tunnel to an RPC client.
//!
//! The core does not speak any RPC protocol. [`RpcClient`] is the handle it
//! produces: it owns the tunnel and exposes it as an async byte stream for
//! the RPC layer to frame calls over. Other client types can be built from a
//! tunnel by implementing [`RpcTransport`].

use crate::stream::TunnelStream;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// A client type that runs over a tunnel-established stream.
pub trait RpcTransport: Sized {
    /// Take ownership of `stream`. No further handshake happens here.
    fn from_tunnel(stream: TunnelStream) -> Self;
}

impl RpcTransport for TunnelStream {
    fn from_tunnel(stream: TunnelStream) -> Self {
        stream
    }
}

/// RPC client handle bound to an established tunnel.
///
/// Owns the connection; dropping the handle closes it.
#[derive(Debug)]
pub struct RpcClient {
    stream: TunnelStream,
}

impl RpcClient {
    /// Endpoint the tunnel was dialed to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.stream.endpoint()
    }

    /// Mutable access to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut TunnelStream {
        &mut self.stream
    }

    /// Give back the underlying stream.
    #[must_use]
    pub fn into_stream(self) -> TunnelStream {
        self.stream
    }
}

impl RpcTransport for RpcClient {
    fn from_tunnel(stream: TunnelStream) -> Self {
        Self { stream }
    }
}

/// Wrap a tunnel-established stream as the transport of an RPC client.
#[must_use]
pub fn as_rpc_transport(stream: TunnelStream) -> RpcClient {
    RpcClient::from_tunnel(stream)
}

impl AsyncRead for RpcClient {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for RpcClient {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_shutdown(cx)
    }
}
