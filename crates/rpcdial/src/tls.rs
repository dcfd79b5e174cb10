//! Transport client: TLS to the proxy and the HTTP identity of the dialer.
//!
//! Certificate verification is always on. A `TransportClient` can be given a
//! different set of trust anchors (a private CA, say) but there is no way to
//! build one that skips verification.

use crate::raw::BoxConn;
use rustls::pki_types::ServerName;
use rustls::RootCertStore;
use std::fmt;
use std::io;
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use tracing::debug;

/// User-Agent sent on CONNECT requests unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("rpcdial/", env!("CARGO_PKG_VERSION"));

/// TLS connector plus request identity shared by every dial.
#[derive(Clone)]
pub struct TransportClient {
    connector: TlsConnector,
    user_agent: String,
}

impl TransportClient {
    /// Client trusting the bundled Mozilla root set (`webpki-roots`).
    pub fn new() -> Result<Self, rustls::Error> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_root_certificates(roots)
    }

    /// Client trusting exactly `roots`.
    pub fn with_root_certificates(roots: RootCertStore) -> Result<Self, rustls::Error> {
        // Use the ring provider explicitly so the choice does not depend on
        // which crypto providers happen to be in the dependency tree.
        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Replace the User-Agent sent on CONNECT requests.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// User-Agent sent on CONNECT requests.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Run a TLS client handshake over `conn`, verifying the peer as `host`.
    ///
    /// On failure the raw connection is closed before the error is returned.
    pub async fn handshake(&self, host: &str, conn: BoxConn) -> io::Result<BoxConn> {
        let server_name = match ServerName::try_from(host.to_string()) {
            Ok(name) => name,
            Err(_) => {
                drop(conn);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid server name for TLS: {}", host),
                ));
            }
        };

        match self.connector.connect(server_name, conn).into_fallible().await {
            Ok(tls) => Ok(Box::new(tls)),
            Err((e, conn)) => {
                debug!("TLS handshake with {} failed: {}", host, e);
                drop(conn);
                Err(e)
            }
        }
    }
}

impl fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}
