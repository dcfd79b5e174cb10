//! Endpoint parsing.
//!
//! Turns a user-supplied endpoint string such as
//! `http://proxy.example:8080/_goRPC_` into its scheme, host and authority.
//! Parsing is pure: no DNS, no sockets.

use std::fmt;
use thiserror::Error;
use url::Url;

/// Why an endpoint string could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid control character in URL at byte {position}")]
    ControlCharacter { position: usize },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("missing host in endpoint")]
    MissingHost,
}

/// URI scheme of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scheme {
    /// Plaintext to the proxy. Also used when the input had no scheme.
    Http,
    /// TLS to the proxy.
    Https,
    /// Anything else; parses fine but is never dialed.
    Other(String),
}

impl Scheme {
    fn from_url(scheme: &str) -> Self {
        match scheme {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => Scheme::Other(other.to_string()),
        }
    }

    /// The scheme as written in a URI.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Other(s) => s,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed endpoint. Produced once per dial and not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEndpoint {
    url: Url,
    scheme: Scheme,
    host: String,
    authority: String,
    has_path: bool,
}

impl ParsedEndpoint {
    /// The endpoint scheme.
    #[must_use]
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Host without brackets, used for TLS server name verification.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// `host:port` to open the raw connection to.
    #[must_use]
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Path and query of the endpoint (e.g. `/_goRPC_`).
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }

    /// Whether the input spelled out a path. `http://host` and `http://host/`
    /// normalize to the same URL but are addressed differently on the wire.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.has_path
    }

    /// The full normalized endpoint string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for ParsedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse an endpoint string.
///
/// Control characters are rejected up front. A scheme-less `//host:port/path`
/// reference is read as `http`. When no port is given the scheme's default
/// port is used.
pub fn parse(endpoint: &str) -> Result<ParsedEndpoint, ParseError> {
    if let Some(position) = endpoint.bytes().position(|b| b.is_ascii_control()) {
        return Err(ParseError::ControlCharacter { position });
    }

    let url = if endpoint.starts_with("//") {
        Url::parse(&format!("http:{}", endpoint))?
    } else {
        Url::parse(endpoint)?
    };

    let host = match url.host() {
        Some(url::Host::Domain(d)) if !d.is_empty() => d.to_string(),
        Some(url::Host::Ipv4(ip)) => ip.to_string(),
        Some(url::Host::Ipv6(ip)) => ip.to_string(),
        _ => return Err(ParseError::MissingHost),
    };
    // host_str keeps the brackets around IPv6 literals, which is what a
    // socket address string needs.
    let host_str = url.host_str().ok_or(ParseError::MissingHost)?;
    let authority = match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host_str, port),
        None => host_str.to_string(),
    };

    Ok(ParsedEndpoint {
        scheme: Scheme::from_url(url.scheme()),
        host,
        authority,
        has_path: has_explicit_path(endpoint),
        url,
    })
}

/// True when something after the authority starts with `/`.
fn has_explicit_path(endpoint: &str) -> bool {
    let Some((_, rest)) = endpoint.split_once("//") else {
        return false;
    };
    rest.find(['/', '?', '#'])
        .is_some_and(|i| rest.as_bytes()[i] == b'/')
}
