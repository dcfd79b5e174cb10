//! Audit logging for established tunnels.
//!
//! One structured `tracing` event per tunnel, with target `rpcdial::audit`.
//! Failed dials are returned to the caller and are not logged here.

use crate::endpoint::ParsedEndpoint;
use tracing::info;

/// Log a tunnel that passed CONNECT validation.
pub fn log_established(endpoint: &ParsedEndpoint, buffered: usize) {
    info!(
        target: "rpcdial::audit",
        endpoint = endpoint.as_str(),
        scheme = %endpoint.scheme(),
        authority = endpoint.authority(),
        buffered = buffered,
        "tunnel established"
    );
}
