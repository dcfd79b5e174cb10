//! Test doubles shared by the unit tests.

#![allow(clippy::unwrap_used)]

use crate::raw::{within, BoxConn, DialFuture, RawDialer};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

/// Connect attempts and closed connections seen by a test dialer.
#[derive(Debug, Default)]
pub struct Counters {
    connects: AtomicUsize,
    closes: AtomicUsize,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// Wraps a connection and counts its close (drop).
pub struct CountedConn<T> {
    inner: T,
    counters: Arc<Counters>,
}

impl<T> Drop for CountedConn<T> {
    fn drop(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: AsyncRead + Unpin> AsyncRead for CountedConn<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for CountedConn<T> {
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

/// In-memory connection: replays a canned response, records writes.
pub struct ScriptedConn {
    response: Vec<u8>,
    pos: usize,
    written: Arc<Mutex<Vec<u8>>>,
    fail_writes: bool,
}

impl AsyncRead for ScriptedConn {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let n = buf.remaining().min(this.response.len() - this.pos);
        buf.put_slice(&this.response[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for ScriptedConn {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        self.written.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Raw dialer handing out [`ScriptedConn`]s.
#[derive(Clone)]
pub struct ScriptedDialer {
    response: Vec<u8>,
    fail_writes: bool,
    written: Arc<Mutex<Vec<u8>>>,
    counters: Arc<Counters>,
}

impl ScriptedDialer {
    pub fn new(response: &[u8]) -> Self {
        Self {
            response: response.to_vec(),
            fail_writes: false,
            written: Arc::default(),
            counters: Arc::default(),
        }
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn written(&self) -> Vec<u8> {
        self.written.lock().unwrap().clone()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl RawDialer for ScriptedDialer {
    fn dial<'a>(&'a self, _authority: &'a str) -> DialFuture<'a> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        let conn = CountedConn {
            inner: ScriptedConn {
                response: self.response.clone(),
                pos: 0,
                written: Arc::clone(&self.written),
                fail_writes: self.fail_writes,
            },
            counters: Arc::clone(&self.counters),
        };
        Box::pin(async move { Ok(Box::new(conn) as BoxConn) })
    }
}

/// Raw dialer that connects to a fixed local address over TCP.
#[derive(Clone)]
pub struct TcpTestDialer {
    target: SocketAddr,
    counters: Arc<Counters>,
}

impl TcpTestDialer {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            target,
            counters: Arc::default(),
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl RawDialer for TcpTestDialer {
    fn dial<'a>(&'a self, _authority: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            let stream = TcpStream::connect(self.target).await?;
            Ok(Box::new(CountedConn {
                inner: stream,
                counters: Arc::clone(&self.counters),
            }) as BoxConn)
        })
    }
}

/// Raw dialer whose every attempt is refused.
#[derive(Clone, Default)]
pub struct RefusingDialer {
    counters: Arc<Counters>,
}

impl RefusingDialer {
    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl RawDialer for RefusingDialer {
    fn dial<'a>(&'a self, authority: &'a str) -> DialFuture<'a> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("connection to {} refused", authority),
            ))
        })
    }
}

/// Raw dialer whose connection never completes, bounded by `timeout`.
#[derive(Clone)]
pub struct StalledDialer {
    timeout: Duration,
    counters: Arc<Counters>,
}

impl StalledDialer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            counters: Arc::default(),
        }
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl RawDialer for StalledDialer {
    fn dial<'a>(&'a self, authority: &'a str) -> DialFuture<'a> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);
        Box::pin(within(
            self.timeout,
            authority,
            std::future::pending::<io::Result<BoxConn>>(),
        ))
    }
}

/// Proxy side of the exchange: read the CONNECT head, answer with
/// `status_line` the way the RPC peer does (HTTP/1.0, bare newlines).
/// Returns the stream and the request head that was read.
pub async fn accept_connect<S>(mut stream: S, status_line: &str) -> io::Result<(S, Vec<u8>)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).await? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        head.push(byte[0]);
    }
    stream
        .write_all(format!("HTTP/1.0 {}\n\n", status_line).as_bytes())
        .await?;
    stream.flush().await?;
    Ok((stream, head))
}

/// Echo until the peer closes.
pub async fn echo<S>(mut stream: S)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                if stream.write_all(&buf[..n]).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Self-signed certificate and key for `name`.
pub fn self_signed(name: &str) -> (CertificateDer<'static>, PrivateKeyDer<'static>) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec![name.to_string()]).unwrap();
    (
        cert.der().clone(),
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der())),
    )
}

/// TLS acceptor serving `cert`.
pub fn tls_acceptor(cert: CertificateDer<'static>, key: PrivateKeyDer<'static>) -> TlsAcceptor {
    let config = rustls::ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(vec![cert], key)
    .unwrap();
    TlsAcceptor::from(Arc::new(config))
}
