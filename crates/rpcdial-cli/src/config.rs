//! Turning command-line flags into a dialer configuration.

use crate::cli::DialArgs;
use crate::error::{CliError, Result};
use rpcdial::{DialerConfig, RawDialPolicy, TransportClient};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

impl DialArgs {
    /// Raw dial policy from the timeout, keep-alive and dual-stack flags.
    pub fn raw_policy(&self) -> RawDialPolicy {
        RawDialPolicy {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            keep_alive: (self.keep_alive > 0).then(|| Duration::from_secs(self.keep_alive)),
            dual_stack: !self.no_dual_stack,
            ..RawDialPolicy::default()
        }
    }

    /// Transport client override, or `None` when the shared default applies.
    pub fn transport(&self) -> Result<Option<TransportClient>> {
        if self.ca_cert.is_empty() && self.user_agent.is_none() {
            return Ok(None);
        }

        let mut transport = if self.ca_cert.is_empty() {
            TransportClient::new()?
        } else {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            for path in &self.ca_cert {
                let added = add_pem_certificates(&mut roots, path)?;
                debug!("Loaded {} CA certificate(s) from {}", added, path.display());
            }
            TransportClient::with_root_certificates(roots)?
        };

        if let Some(user_agent) = &self.user_agent {
            transport = transport.with_user_agent(user_agent.clone());
        }
        Ok(Some(transport))
    }

    /// Full dialer configuration for these flags.
    pub fn dialer_config(&self) -> Result<DialerConfig> {
        let mut config = DialerConfig::new().with_raw_dialer(self.raw_policy());
        if let Some(transport) = self.transport()? {
            config = config.with_transport(transport);
        }
        Ok(config)
    }
}

fn add_pem_certificates(roots: &mut RootCertStore, path: &Path) -> Result<usize> {
    let ca_err = |source| CliError::CaCert {
        path: path.to_path_buf(),
        source,
    };

    let mut added = 0;
    for cert in CertificateDer::pem_file_iter(path).map_err(ca_err)? {
        roots.add(cert.map_err(ca_err)?)?;
        added += 1;
    }

    if added == 0 {
        return Err(CliError::NoCertificates {
            path: path.to_path_buf(),
        });
    }
    Ok(added)
}
