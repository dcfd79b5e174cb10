//! Tunnel dialer.
//!
//! Opens one raw connection per attempt, performs the scheme's handshake,
//! sends `CONNECT`, and accepts the connection only if the proxy answers with
//! exactly [`CONNECTED`]:
//!
//! 1. Parse the endpoint
//! 2. Build the CONNECT request
//! 3. Pick the handshake for the scheme (unknown schemes stop here)
//! 4. Open the raw connection
//! 5. TLS handshake for `https`
//! 6. Write the request, read one response head
//! 7. Compare the status line and hand over the stream
//!
//! Every failure after step 4 drops the connection before returning.

use crate::audit;
use crate::config::DialerConfig;
use crate::endpoint::{self, Scheme};
use crate::error::{DialError, DialErrorKind, Result};
use crate::request::TunnelRequest;
use crate::response::read_response_head;
use crate::rpc::{RpcClient, RpcTransport};
use crate::stream::TunnelStream;
use std::sync::LazyLock;
use tokio::io::BufReader;
use tracing::debug;

/// Status line a peer must answer CONNECT with. Compared literally; other
/// 2xx statuses are rejected.
pub const CONNECTED: &str = "200 Connected to Go RPC";

static DEFAULT_DIALER: LazyLock<Dialer> = LazyLock::new(Dialer::default);

/// Handshake performed on the raw connection before CONNECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handshake {
    /// Use the raw connection unchanged.
    Plain,
    /// Wrap the raw connection in a verified TLS session.
    Tls,
}

impl Handshake {
    fn for_scheme(scheme: &Scheme) -> Option<Self> {
        match scheme {
            Scheme::Http => Some(Handshake::Plain),
            Scheme::Https => Some(Handshake::Tls),
            Scheme::Other(_) => None,
        }
    }
}

/// Dials RPC endpoints through HTTP CONNECT.
///
/// Holds only read-only configuration; share it freely between tasks.
#[derive(Debug, Clone, Default)]
pub struct Dialer {
    config: DialerConfig,
}

impl Dialer {
    /// Dialer using `config`.
    #[must_use]
    pub fn new(config: DialerConfig) -> Self {
        Self { config }
    }

    /// The configuration this dialer was built with.
    #[must_use]
    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Dial `endpoint` and hand the tunnel to a new [`RpcClient`].
    pub async fn dial_http(&self, endpoint: &str) -> Result<RpcClient> {
        self.dial_http_with(endpoint).await
    }

    /// Dial `endpoint` and hand the tunnel to any [`RpcTransport`].
    pub async fn dial_http_with<C: RpcTransport>(&self, endpoint: &str) -> Result<C> {
        let stream = self.dial_tunnel(endpoint).await?;
        Ok(C::from_tunnel(stream))
    }

    /// Dial `endpoint` and return the established tunnel.
    pub async fn dial_tunnel(&self, endpoint: &str) -> Result<TunnelStream> {
        let parsed =
            endpoint::parse(endpoint).map_err(|e| DialError::new(endpoint, e.into()))?;
        let addr = parsed.as_str();
        let fail = |kind: DialErrorKind| DialError::new(addr, kind);

        let transport = self
            .config
            .transport()
            .map_err(|e| fail(DialErrorKind::TlsConfig(e)))?;
        let request = TunnelRequest::new(&parsed, transport.user_agent())
            .map_err(|e| fail(DialErrorKind::BuildRequest(e)))?;
        let handshake = Handshake::for_scheme(parsed.scheme()).ok_or_else(|| {
            fail(DialErrorKind::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
            })
        })?;

        let raw_dialer = self.config.raw_dialer();
        debug!("Connecting to {} for {}", parsed.authority(), addr);
        let raw = raw_dialer
            .dial(parsed.authority())
            .await
            .map_err(|e| fail(DialErrorKind::Connect(e)))?;

        let mut conn = match handshake {
            Handshake::Plain => raw,
            Handshake::Tls => transport
                .handshake(parsed.host(), raw)
                .await
                .map_err(|e| fail(DialErrorKind::TlsHandshake(e)))?,
        };

        if let Err(e) = request.write_to(&mut conn).await {
            drop(conn);
            return Err(fail(DialErrorKind::SendRequest(e)));
        }
        debug!("Sent CONNECT {} to {}", request.target(), parsed.authority());

        let mut reader = BufReader::new(conn);
        let head = match read_response_head(&mut reader).await {
            Ok(head) => head,
            Err(e) => {
                drop(reader);
                return Err(fail(DialErrorKind::ReadResponse(e)));
            }
        };

        let status = head.status();
        debug!("CONNECT {} answered with {:?}", addr, status);
        if status != CONNECTED {
            drop(reader);
            return Err(fail(DialErrorKind::UnexpectedResponse { status }));
        }

        // Bytes read past the head already belong to the RPC protocol.
        let leftover = reader.buffer().to_vec();
        let conn = reader.into_inner();
        audit::log_established(&parsed, leftover.len());
        Ok(TunnelStream::new(conn, leftover, addr))
    }
}

/// The process-wide default dialer.
#[must_use]
pub fn default_dialer() -> &'static Dialer {
    &DEFAULT_DIALER
}

/// Dial `endpoint` with the default dialer and return an [`RpcClient`].
pub async fn dial_http(endpoint: &str) -> Result<RpcClient> {
    default_dialer().dial_http(endpoint).await
}

/// Dial `endpoint` with the default dialer and return the raw tunnel.
pub async fn dial_tunnel(endpoint: &str) -> Result<TunnelStream> {
    default_dialer().dial_tunnel(endpoint).await
}
