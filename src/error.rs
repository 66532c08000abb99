//! Error types for certificate retrieval and normalization.
//!
//! Every stage of a check fails fast with one of these variants; no partial
//! summary is ever produced for a failing target.

use std::fmt;
use std::io;

/// Error type covering every way a certificate check can fail.
///
/// Variants carry the offending input, address, or value so callers can
/// surface it verbatim alongside the error kind.
#[derive(Debug)]
pub enum CheckError {
    /// The `host[:port]` input string was malformed
    InvalidTarget {
        /// The original input string
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// DNS resolution failed for the given hostname
    Resolution {
        /// The hostname that failed to resolve
        hostname: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The TCP connection did not complete within the deadline
    ConnectionTimeout {
        /// The address (host:port) that timed out
        address: String,
    },

    /// TCP connection refused or otherwise failed
    Connection {
        /// The address (host:port) that connection failed to
        address: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// TLS handshake could not complete
    TlsHandshake {
        /// Details about why the handshake failed
        details: String,
    },

    /// A certificate validity timestamp could not be parsed
    TimestampParse {
        /// The timestamp string as presented by the certificate
        value: String,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget { input, reason } => {
                write!(f, "Invalid target '{}': {}", input, reason)
            }
            Self::Resolution { hostname, .. } => {
                write!(
                    f,
                    "Failed to resolve hostname: {}. Check that the hostname is spelled correctly and your DNS configuration is working.",
                    hostname
                )
            }
            Self::ConnectionTimeout { address } => {
                write!(
                    f,
                    "Connection timed out to: {}. The host did not complete the TCP handshake in time.",
                    address
                )
            }
            Self::Connection { address, .. } => {
                write!(
                    f,
                    "Connection failed to: {}. Verify the host is running a TLS service and is reachable.",
                    address
                )
            }
            Self::TlsHandshake { details } => {
                write!(f, "TLS handshake failed: {}", details)
            }
            Self::TimestampParse { value } => {
                write!(f, "Unparseable certificate timestamp: '{}'", value)
            }
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolution { source, .. } => Some(source),
            Self::Connection { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<openssl::error::ErrorStack> for CheckError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::TlsHandshake {
            details: e.to_string(),
        }
    }
}

impl<S: fmt::Debug> From<openssl::ssl::HandshakeError<S>> for CheckError {
    fn from(e: openssl::ssl::HandshakeError<S>) -> Self {
        Self::TlsHandshake {
            details: format!("{}", e),
        }
    }
}
