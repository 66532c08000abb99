//! Certificate metadata retrieval for operational monitoring.
//!
//! certpeek connects to a remote host, completes a TLS handshake without
//! enforcing trust, and reduces the peer certificate to a flat summary of
//! subject, issuer, validity window, and resolved address. Because the
//! handshake skips verification, checks succeed against self-signed,
//! expired, and untrusted certificates, which is the whole point: this is
//! an observer of certificate metadata, not a trust decision.
//!
//! ```no_run
//! use certpeek::CertificateSummary;
//!
//! let summary = CertificateSummary::from("example.com:8443")?;
//! println!("{} expires {}", summary.domain, summary.expire_date);
//! # Ok::<(), certpeek::CheckError>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
mod fetcher;
mod normalizer;
mod target;

pub use error::CheckError;
pub use fetcher::{RawCertificate, SOCKET_TIMEOUT};
pub use normalizer::{DistinguishedName, DATETIME_FORMAT};
pub use target::{Target, DEFAULT_PORT};

/// Normalized summary of the certificate a remote host presents.
///
/// `domain` is the original `host[:port]` input verbatim; `start_date` and
/// `expire_date` are rendered as `YYYY-MM-DD HH:MM:SS` in the local
/// timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    pub domain: String,
    pub ip: String,
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub start_date: String,
    pub expire_date: String,
}

impl CertificateSummary {
    /// Runs a full check for a `host[:port]` input string.
    ///
    /// Parses the target, fetches the peer certificate over one TCP
    /// connection and TLS handshake, and normalizes the result. Each check
    /// is self-contained and blocking with no shared state, so callers may
    /// run many concurrently, one target per thread.
    pub fn from(input: &str) -> Result<CertificateSummary, CheckError> {
        let target = Target::parse(input)?;
        let (raw, ip) = fetcher::fetch(&target.hostname, target.port)?;
        normalizer::normalize(&raw, &ip, input)
    }
}
