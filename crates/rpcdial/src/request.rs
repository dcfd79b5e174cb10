//! CONNECT request construction and serialization.

use crate::endpoint::ParsedEndpoint;
use http::header::{HOST, USER_AGENT};
use http::{Method, Request, Version};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// An HTTP CONNECT request addressed to a parsed endpoint. Carries no body.
#[derive(Debug)]
pub struct TunnelRequest {
    inner: Request<()>,
    target: String,
}

impl TunnelRequest {
    /// Build the CONNECT request for `endpoint`.
    ///
    /// The request URI is the full endpoint string. Fails when that string
    /// or the authority is not acceptable to the HTTP layer.
    pub fn new(endpoint: &ParsedEndpoint, user_agent: &str) -> Result<Self, http::Error> {
        let inner = Request::builder()
            .method(Method::CONNECT)
            .uri(endpoint.as_str())
            .version(Version::HTTP_11)
            .header(HOST, endpoint.authority())
            .header(USER_AGENT, user_agent)
            .body(())?;

        // CONNECT to an RPC handler is addressed by path; a bare authority
        // is only used when the endpoint has no path of its own.
        let target = if endpoint.has_path() {
            endpoint.path_and_query()
        } else {
            endpoint.authority().to_string()
        };

        Ok(Self { inner, target })
    }

    /// The request-target written on the request line.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The underlying `http` request.
    #[must_use]
    pub fn as_http(&self) -> &Request<()> {
        &self.inner
    }

    /// HTTP/1.1 wire form: request line, headers, blank line.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(b"CONNECT ");
        out.extend_from_slice(self.target.as_bytes());
        out.extend_from_slice(b" HTTP/1.1\r\n");
        for (name, value) in self.inner.headers() {
            out.extend_from_slice(name.as_str().as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }

    /// Write the request onto `writer` and flush it.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.encode()).await?;
        writer.flush().await
    }
}
