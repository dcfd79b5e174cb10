//! Dial RPC endpoints that sit behind an HTTP CONNECT handshake.
//!
//! `rpcdial` opens a connection to an `http://` or `https://` endpoint,
//! sends `CONNECT <path>`, and accepts the connection only when the peer
//! answers with the exact status `200 Connected to Go RPC`. The validated
//! stream is then handed to an RPC client:
//!
//! 1. **Raw dial** (`raw`) - TCP with a connect timeout, keep-alive, and a
//!    dual-stack fallback race. Replaceable through [`RawDialer`].
//!
//! 2. **Transport** (`tls`) - Verified TLS for `https` endpoints and the
//!    User-Agent sent with the request.
//!
//! 3. **Handshake** (`dialer`) - CONNECT request, response head parsing,
//!    and the status check. Bytes the peer sent after the head are kept.
//!
//! Every failure is reported as a [`DialError`] with operation `dial-http`
//! and the endpoint as given, and closes any connection it opened.

pub mod audit;
pub mod config;
pub mod dialer;
pub mod endpoint;
pub mod error;
pub mod raw;
pub mod request;
pub mod response;
pub mod rpc;
pub mod stream;
pub mod tls;

#[cfg(test)]
mod testing;

pub use config::DialerConfig;
pub use dialer::{default_dialer, dial_http, dial_tunnel, Dialer, CONNECTED};
pub use endpoint::{ParseError, ParsedEndpoint, Scheme};
pub use error::{DialError, DialErrorKind, Result};
pub use raw::{RawDialPolicy, RawDialer};
pub use rpc::{as_rpc_transport, RpcClient, RpcTransport};
pub use stream::TunnelStream;
pub use tls::TransportClient;
