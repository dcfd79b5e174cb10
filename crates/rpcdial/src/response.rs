//! Reading the proxy's answer to a CONNECT request.
//!
//! Only the response head is consumed. Whatever follows it belongs to the
//! tunnelled protocol, so the caller keeps the buffered reader's leftover.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Maximum size of a response head (64 KiB).
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Maximum number of response headers accepted.
const MAX_HEADERS: usize = 64;

/// Why a response head could not be read.
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before response head was complete")]
    Closed,

    #[error("response head exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed HTTP response: {0}")]
    Malformed(#[from] httparse::Error),

    #[error("incomplete HTTP response head")]
    Incomplete,
}

/// Parsed status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    version: u8,
    code: u16,
    reason: String,
    headers: Vec<(String, Vec<u8>)>,
}

impl ResponseHead {
    /// Minor HTTP version (`0` for HTTP/1.0, `1` for HTTP/1.1).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Numeric status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Reason phrase as sent by the peer.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Status as `"<code> <reason>"`, e.g. `"200 Connected to Go RPC"`.
    #[must_use]
    pub fn status(&self) -> String {
        if self.reason.is_empty() {
            self.code.to_string()
        } else {
            format!("{} {}", self.code, self.reason)
        }
    }

    /// First value of header `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }

    /// Parse a complete head (status line through the blank line).
    pub fn parse(head: &[u8]) -> Result<Self, ResponseError> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut response = httparse::Response::new(&mut headers);
        match response.parse(head)? {
            httparse::Status::Complete(_) => {}
            httparse::Status::Partial => return Err(ResponseError::Incomplete),
        }

        let (Some(version), Some(code)) = (response.version, response.code) else {
            return Err(ResponseError::Incomplete);
        };
        Ok(Self {
            version,
            code,
            reason: response.reason.unwrap_or_default().to_string(),
            headers: response
                .headers
                .iter()
                .map(|h| (h.name.to_string(), h.value.to_vec()))
                .collect(),
        })
    }
}

/// Read one response head from `reader`.
///
/// Lines are consumed up to and including the first empty line; bare `\n`
/// terminators are accepted. Nothing past the head is consumed from the
/// reader's buffer.
pub async fn read_response_head<R>(reader: &mut R) -> Result<ResponseHead, ResponseError>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut head = Vec::new();
    loop {
        let start = head.len();
        // One byte past the cap is enough to tell an oversized head apart.
        let budget = (MAX_HEAD_SIZE + 1 - head.len()) as u64;
        let n = (&mut *reader)
            .take(budget)
            .read_until(b'\n', &mut head)
            .await?;
        if n == 0 {
            return Err(ResponseError::Closed);
        }
        if head.len() > MAX_HEAD_SIZE {
            return Err(ResponseError::TooLarge {
                limit: MAX_HEAD_SIZE,
            });
        }
        let line = &head[start..];
        if line == b"\r\n" || line == b"\n" {
            break;
        }
        if !line.ends_with(b"\n") {
            return Err(ResponseError::Closed);
        }
    }
    ResponseHead::parse(&head)
}
