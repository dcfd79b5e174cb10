//! Error types for the rpcdial crate.

use crate::endpoint::ParseError;
use crate::response::ResponseError;
use thiserror::Error;

/// Operation label carried by every dial failure.
pub const DIAL_OP: &str = "dial-http";

/// A failed dial attempt.
///
/// Carries the operation label, the target address (the normalized endpoint
/// string, or the raw input when it could not be parsed) and the cause.
#[derive(Error, Debug)]
#[error("{op} {addr}: {kind}")]
pub struct DialError {
    op: &'static str,
    addr: String,
    #[source]
    kind: DialErrorKind,
}

impl DialError {
    pub(crate) fn new(addr: impl Into<String>, kind: DialErrorKind) -> Self {
        Self {
            op: DIAL_OP,
            addr: addr.into(),
            kind,
        }
    }

    /// Operation label, always `"dial-http"`.
    #[must_use]
    pub fn op(&self) -> &'static str {
        self.op
    }

    /// Target address of the failed dial.
    #[must_use]
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The underlying cause.
    #[must_use]
    pub fn kind(&self) -> &DialErrorKind {
        &self.kind
    }

    /// Short label of the step that failed (see [`DialErrorKind::phase`]).
    #[must_use]
    pub fn phase(&self) -> &'static str {
        self.kind.phase()
    }

    /// Consume the error, returning the cause.
    #[must_use]
    pub fn into_kind(self) -> DialErrorKind {
        self.kind
    }
}

/// Why a dial attempt failed.
#[derive(Error, Debug)]
pub enum DialErrorKind {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cannot build CONNECT request: {0}")]
    BuildRequest(#[source] http::Error),

    #[error("scheme {scheme:?} is not supported")]
    UnsupportedScheme { scheme: String },

    #[error(transparent)]
    Connect(std::io::Error),

    #[error("TLS configuration error: {0}")]
    TlsConfig(#[source] rustls::Error),

    #[error("TLS handshake failed: {0}")]
    TlsHandshake(#[source] std::io::Error),

    #[error("failed to send CONNECT request: {0}")]
    SendRequest(#[source] std::io::Error),

    #[error("failed to read CONNECT response: {0}")]
    ReadResponse(#[source] ResponseError),

    #[error("unexpected HTTP response: {status}")]
    UnexpectedResponse { status: String },
}

impl DialErrorKind {
    /// Label of the dial step this failure belongs to.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            DialErrorKind::Parse(_) => "parse",
            DialErrorKind::BuildRequest(_) => "build-request",
            DialErrorKind::UnsupportedScheme { .. } => "unsupported-scheme",
            DialErrorKind::Connect(_) => "connect",
            DialErrorKind::TlsConfig(_) => "tls-config",
            DialErrorKind::TlsHandshake(_) => "tls-handshake",
            DialErrorKind::SendRequest(_) => "send-request",
            DialErrorKind::ReadResponse(_) => "read-response",
            DialErrorKind::UnexpectedResponse { .. } => DIAL_OP,
        }
    }
}

/// Result type alias for dial operations.
pub type Result<T> = std::result::Result<T, DialError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_includes_op_addr_and_cause() {
        let err = DialError::new(
            "http://proxy.example:8080/_goRPC_",
            DialErrorKind::UnexpectedResponse {
                status: "200 OK".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "dial-http http://proxy.example:8080/_goRPC_: unexpected HTTP response: 200 OK"
        );
        assert_eq!(err.phase(), "dial-http");
    }

    #[test]
    fn test_connect_error_preserves_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DialError::new("http://a:1/", DialErrorKind::Connect(io));
        assert_eq!(err.phase(), "connect");
        assert_eq!(err.to_string(), "dial-http http://a:1/: refused");
        match err.kind() {
            DialErrorKind::Connect(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionRefused),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_source_chain() {
        let err = DialError::new(
            "http://a:1/",
            DialErrorKind::SendRequest(std::io::Error::other("broken pipe")),
        );
        let source = err.source().unwrap();
        assert!(source.to_string().contains("broken pipe"));
    }
}
