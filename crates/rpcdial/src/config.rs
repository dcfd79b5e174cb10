//! Dialer configuration and the process-wide defaults.
//!
//! Every field of [`DialerConfig`] is optional. Absent fields resolve to the
//! defaults below at the start of each dial; the config itself is never
//! modified, so one value can be shared by any number of concurrent dials.

use crate::raw::{RawDialPolicy, RawDialer};
use crate::tls::TransportClient;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Default raw dial policy: 30s connect timeout, 30s keep-alive, dual-stack.
static DEFAULT_RAW_DIALER: LazyLock<Arc<RawDialPolicy>> =
    LazyLock::new(|| Arc::new(RawDialPolicy::default()));

/// Default transport client, built once with the bundled web PKI roots.
static DEFAULT_TRANSPORT: LazyLock<Result<Arc<TransportClient>, rustls::Error>> =
    LazyLock::new(|| TransportClient::new().map(Arc::new));

/// Optional overrides for a [`Dialer`](crate::Dialer).
#[derive(Clone, Default)]
pub struct DialerConfig {
    /// Transport client (TLS trust and request identity). Default when `None`.
    pub transport: Option<Arc<TransportClient>>,

    /// Raw connection factory. [`RawDialPolicy::default`] when `None`.
    pub raw_dialer: Option<Arc<dyn RawDialer>>,
}

impl DialerConfig {
    /// Config with every field left to its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `transport` instead of the default transport client.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportClient) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Use `dialer` to open raw connections.
    #[must_use]
    pub fn with_raw_dialer(mut self, dialer: impl RawDialer + 'static) -> Self {
        self.raw_dialer = Some(Arc::new(dialer));
        self
    }

    /// The transport client in effect.
    pub fn transport(&self) -> Result<Arc<TransportClient>, rustls::Error> {
        match &self.transport {
            Some(transport) => Ok(Arc::clone(transport)),
            None => DEFAULT_TRANSPORT.as_ref().map(Arc::clone).map_err(Clone::clone),
        }
    }

    /// The raw dialer in effect.
    #[must_use]
    pub fn raw_dialer(&self) -> Arc<dyn RawDialer> {
        match &self.raw_dialer {
            Some(dialer) => Arc::clone(dialer),
            None => default_raw_dialer(),
        }
    }
}

/// The shared default raw dial policy.
#[must_use]
pub fn default_raw_dialer() -> Arc<dyn RawDialer> {
    let policy: Arc<RawDialPolicy> = Arc::clone(&DEFAULT_RAW_DIALER);
    policy
}

impl fmt::Debug for DialerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialerConfig")
            .field("transport", &self.transport)
            .field("raw_dialer", &self.raw_dialer.as_ref().map(|_| "custom"))
            .finish()
    }
}
