//! Raw transport connections.
//!
//! [`RawDialer`] is the seam through which the dialer opens its single
//! connection per attempt. [`RawDialPolicy`] is the TCP implementation:
//! connect timeout, keep-alive and dual-stack (Happy Eyeballs) fallback.

use serde::{Deserialize, Serialize};
use socket2::{SockRef, TcpKeepalive};
use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP keep-alive period.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Default delay before racing the second address family.
pub const DEFAULT_FALLBACK_DELAY: Duration = Duration::from_millis(300);

/// A bidirectional byte stream usable as a tunnel transport.
pub trait Conn: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Conn for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Owned, type-erased connection. Dropping it closes the connection.
pub type BoxConn = Box<dyn Conn>;

/// Future returned by [`RawDialer::dial`].
pub type DialFuture<'a> = Pin<Box<dyn Future<Output = io::Result<BoxConn>> + Send + 'a>>;

/// Factory for raw transport connections.
pub trait RawDialer: Send + Sync {
    /// Open a connection to `authority` (`host:port`).
    fn dial<'a>(&'a self, authority: &'a str) -> DialFuture<'a>;
}

/// TCP dial policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDialPolicy {
    /// Bound on name resolution plus connect.
    pub connect_timeout: Duration,

    /// TCP keep-alive idle period (`None` leaves keep-alive off).
    pub keep_alive: Option<Duration>,

    /// Race both address families instead of trying addresses in order.
    pub dual_stack: bool,

    /// Head start given to the first address family when racing.
    pub fallback_delay: Duration,
}

impl Default for RawDialPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            keep_alive: Some(DEFAULT_KEEP_ALIVE),
            dual_stack: true,
            fallback_delay: DEFAULT_FALLBACK_DELAY,
        }
    }
}

impl RawDialPolicy {
    /// Resolve `authority` and connect to it under this policy.
    pub async fn connect(&self, authority: &str) -> io::Result<TcpStream> {
        let attempt = self.resolve_and_connect(authority);
        let stream = within(self.connect_timeout, authority, attempt).await?;

        stream.set_nodelay(true)?;
        if let Some(period) = self.keep_alive {
            SockRef::from(&stream).set_tcp_keepalive(&TcpKeepalive::new().with_time(period))?;
        }
        Ok(stream)
    }

    async fn resolve_and_connect(&self, authority: &str) -> io::Result<TcpStream> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(authority).await?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses found for {}", authority),
            ));
        }

        if !self.dual_stack {
            return connect_in_order(&addrs).await;
        }
        let (primary, fallback) = partition_by_family(addrs);
        race(&primary, &fallback, self.fallback_delay).await
    }
}

impl RawDialer for RawDialPolicy {
    fn dial<'a>(&'a self, authority: &'a str) -> DialFuture<'a> {
        Box::pin(async move {
            let stream = self.connect(authority).await?;
            Ok(Box::new(stream) as BoxConn)
        })
    }
}

/// Bound `attempt` by `timeout`; an elapsed timeout is a `TimedOut` error.
pub(crate) async fn within<T>(
    timeout: Duration,
    authority: &str,
    attempt: impl Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => {
            debug!("Connect to {} timed out", authority);
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection to {} timed out", authority),
            ))
        }
    }
}

/// Split addresses into the family of the first address and the rest,
/// keeping resolver order within each family.
fn partition_by_family(addrs: Vec<SocketAddr>) -> (Vec<SocketAddr>, Vec<SocketAddr>) {
    let first_is_v4 = addrs.first().is_some_and(SocketAddr::is_ipv4);
    addrs
        .into_iter()
        .partition(|addr| addr.is_ipv4() == first_is_v4)
}

/// Race the primary family against the fallback family, which starts after
/// `delay`.
async fn race(
    primary: &[SocketAddr],
    fallback: &[SocketAddr],
    delay: Duration,
) -> io::Result<TcpStream> {
    if fallback.is_empty() {
        return connect_in_order(primary).await;
    }
    race_attempts(connect_in_order(primary), connect_in_order(fallback), delay).await
}

/// The first attempt to succeed wins. If both fail, the primary error is
/// returned.
async fn race_attempts<T>(
    primary: impl Future<Output = io::Result<T>>,
    fallback: impl Future<Output = io::Result<T>>,
    delay: Duration,
) -> io::Result<T> {
    let fallback = async {
        tokio::time::sleep(delay).await;
        fallback.await
    };
    tokio::pin!(primary);
    tokio::pin!(fallback);

    tokio::select! {
        result = &mut primary => match result {
            Ok(stream) => Ok(stream),
            Err(primary_err) => {
                debug!("Primary address family failed: {}", primary_err);
                fallback.await.map_err(|_| primary_err)
            }
        },
        result = &mut fallback => match result {
            Ok(stream) => Ok(stream),
            Err(fallback_err) => {
                debug!("Fallback address family failed: {}", fallback_err);
                primary.await
            }
        },
    }
}

/// Try each address in turn until one connects.
async fn connect_in_order(addrs: &[SocketAddr]) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("Connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "no addresses to connect to")
    }))
}

impl fmt::Display for RawDialPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timeout={:?} keep_alive={:?} dual_stack={}",
            self.connect_timeout, self.keep_alive, self.dual_stack
        )
    }
}
