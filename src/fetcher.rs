//! TLS handshake-driven certificate acquisition.
//!
//! Opens a TCP connection to the target, completes a TLS handshake that
//! deliberately skips certificate verification, and extracts the peer
//! certificate's name and validity fields. Verification is skipped because
//! the point of a check is to observe certificate metadata, including for
//! hosts whose certificates are self-signed, expired, or untrusted.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::{X509NameRef, X509Ref};

use crate::error::CheckError;

/// Connect, read, and write deadline applied to every fetch.
///
/// The read/write deadlines also bound the handshake itself, so a server
/// that accepts the TCP connection and then goes silent mid-TLS cannot
/// stall a batch indefinitely.
pub const SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Name and validity fields of a peer certificate, in the shape the TLS
/// layer exposes them.
///
/// Subject and issuer are sequences of relative-distinguished-name groups,
/// each group holding `(long attribute name, value)` pairs. The validity
/// bounds are the vendor's textual timestamps, e.g.
/// `"Jan  1 00:00:00 2030 GMT"`.
#[derive(Debug, Clone)]
pub struct RawCertificate {
    pub subject: Vec<Vec<(String, String)>>,
    pub issuer: Vec<Vec<(String, String)>>,
    pub not_before: String,
    pub not_after: String,
}

/// Fetches the peer certificate presented by `hostname:port`.
///
/// Returns the raw certificate fields together with an address the
/// hostname resolves to. The address comes from a separate lookup and may
/// legitimately differ from the one the fetch connected to under
/// load-balanced DNS.
pub fn fetch(hostname: &str, port: u16) -> Result<(RawCertificate, String), CheckError> {
    let address = format!("{}:{}", hostname, port);
    let socket_addr = resolve(hostname, port)?;

    debug!("connecting to {} ({})", address, socket_addr);
    let tcp_stream = TcpStream::connect_timeout(&socket_addr, SOCKET_TIMEOUT).map_err(|e| {
        if e.kind() == io::ErrorKind::TimedOut {
            CheckError::ConnectionTimeout {
                address: address.clone(),
            }
        } else {
            CheckError::Connection {
                address: address.clone(),
                source: e,
            }
        }
    })?;
    set_socket_deadlines(&tcp_stream, &address)?;

    debug!("starting TLS handshake with {}", hostname);
    let connector = insecure_connector()?;
    let mut stream = connector.connect(hostname, tcp_stream)?;

    let peer = stream
        .ssl()
        .peer_certificate()
        .ok_or_else(|| CheckError::TlsHandshake {
            details: format!("{} presented no peer certificate", hostname),
        })?;
    let raw = raw_certificate(&peer);

    // best-effort close_notify; drop closes the TLS stream and then the
    // TCP socket on every exit path
    let _ = stream.shutdown();

    let ip = resolve_ip(hostname)?;
    Ok((raw, ip))
}

/// Builds the deliberately non-verifying TLS connector used for every fetch.
///
/// Certificate-chain and hostname verification are disabled at the
/// trust-decision level while the handshake protocol itself stays intact,
/// so the peer certificate is exposed even when it would never validate.
/// This connector must never be reused for a connection that is supposed
/// to enforce trust.
fn insecure_connector() -> Result<SslConnector, CheckError> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    builder.set_verify(SslVerifyMode::NONE);
    Ok(builder.build())
}

fn set_socket_deadlines(stream: &TcpStream, address: &str) -> Result<(), CheckError> {
    stream
        .set_read_timeout(Some(SOCKET_TIMEOUT))
        .and_then(|_| stream.set_write_timeout(Some(SOCKET_TIMEOUT)))
        .map_err(|e| CheckError::Connection {
            address: address.to_string(),
            source: e,
        })
}

fn resolve(hostname: &str, port: u16) -> Result<SocketAddr, CheckError> {
    let mut addresses = (hostname, port)
        .to_socket_addrs()
        .map_err(|e| CheckError::Resolution {
            hostname: hostname.to_string(),
            source: e,
        })?;
    addresses.next().ok_or_else(|| CheckError::Resolution {
        hostname: hostname.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, "hostname resolved to no addresses"),
    })
}

/// Separate lookup for the reported address, preferring IPv4 when the
/// hostname resolves to both families.
fn resolve_ip(hostname: &str) -> Result<String, CheckError> {
    let addresses: Vec<SocketAddr> = (hostname, 0)
        .to_socket_addrs()
        .map_err(|e| CheckError::Resolution {
            hostname: hostname.to_string(),
            source: e,
        })?
        .collect();

    addresses
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addresses.first())
        .map(|a| a.ip().to_string())
        .ok_or_else(|| CheckError::Resolution {
            hostname: hostname.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "hostname resolved to no addresses"),
        })
}

fn raw_certificate(cert: &X509Ref) -> RawCertificate {
    RawCertificate {
        subject: name_groups(cert.subject_name()),
        issuer: name_groups(cert.issuer_name()),
        not_before: cert.not_before().to_string(),
        not_after: cert.not_after().to_string(),
    }
}

/// Each X.509 name entry becomes its own one-pair group, which is the
/// shape this certificate source exposes for subject and issuer names.
fn name_groups(name: &X509NameRef) -> Vec<Vec<(String, String)>> {
    name.entries()
        .map(|entry| {
            let attribute = entry
                .object()
                .nid()
                .long_name()
                .map(str::to_string)
                // unmapped attribute types fall back to their OID text
                .unwrap_or_else(|_| entry.object().to_string());
            let value = entry
                .data()
                .as_utf8()
                .map(|s| s.to_string())
                .unwrap_or_default();
            vec![(attribute, value)]
        })
        .collect()
}
