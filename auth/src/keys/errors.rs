use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error type for loading signing key material.
///
/// Every variant is fatal at startup.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("No signing key configured: provide a PEM key pair or a shared secret")]
    NotConfigured,

    #[error("Both a PEM key pair and a shared secret are configured; exactly one is allowed")]
    Ambiguous,

    #[error("Cannot read key file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed key material: {0}")]
    Malformed(String),

    #[error("Private and public keys do not belong to the same pair: {0}")]
    Mismatch(String),
}
