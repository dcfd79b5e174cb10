//! Error types for the rpcdial CLI.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Dial(#[from] rpcdial::DialError),

    #[error("Failed to read CA certificates from {}: {source}", path.display())]
    CaCert {
        path: PathBuf,
        #[source]
        source: rustls::pki_types::pem::Error,
    },

    #[error("No certificates found in {}", path.display())]
    NoCertificates { path: PathBuf },

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
