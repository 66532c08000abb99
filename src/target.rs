//! Target parsing for `host[:port]` input strings.

use crate::error::CheckError;

/// Port used when the input carries no explicit port.
pub const DEFAULT_PORT: u16 = 443;

/// A parsed check target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub port: u16,
}

impl Target {
    /// Splits a `host[:port]` string into hostname and port.
    ///
    /// The port defaults to 443 when absent and must fall in 1-65535 when
    /// present. Anything else, including an empty hostname, is rejected
    /// with [`CheckError::InvalidTarget`].
    pub fn parse(input: &str) -> Result<Target, CheckError> {
        let (hostname, port) = match input.split_once(':') {
            Some((hostname, port_text)) => {
                let port = port_text.parse::<u16>().map_err(|_| CheckError::InvalidTarget {
                    input: input.to_string(),
                    reason: format!("port '{}' is not a valid port number", port_text),
                })?;
                if port == 0 {
                    return Err(CheckError::InvalidTarget {
                        input: input.to_string(),
                        reason: "port 0 is not addressable".to_string(),
                    });
                }
                (hostname, port)
            }
            None => (input, DEFAULT_PORT),
        };

        if hostname.is_empty() {
            return Err(CheckError::InvalidTarget {
                input: input.to_string(),
                reason: "hostname is empty".to_string(),
            });
        }

        Ok(Target {
            hostname: hostname.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_443_without_port() {
        let target = Target::parse("example.com").unwrap();
        assert_eq!(target.hostname, "example.com");
        assert_eq!(target.port, 443);
    }

    #[test]
    fn test_explicit_port() {
        let target = Target::parse("example.com:8443").unwrap();
        assert_eq!(target.hostname, "example.com");
        assert_eq!(target.port, 8443);
    }

    #[test]
    fn test_non_numeric_port_is_rejected() {
        match Target::parse("example.com:notanumber") {
            Err(CheckError::InvalidTarget { input, .. }) => {
                assert_eq!(input, "example.com:notanumber");
            }
            other => panic!("expected InvalidTarget, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_ports_are_rejected() {
        assert!(Target::parse("example.com:0").is_err());
        assert!(Target::parse("example.com:70000").is_err());
        assert!(Target::parse("example.com:-1").is_err());
    }

    #[test]
    fn test_empty_hostname_is_rejected() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse(":443").is_err());
    }

    #[test]
    fn test_empty_port_text_is_rejected() {
        assert!(Target::parse("example.com:").is_err());
    }

    #[test]
    fn test_multiple_colons_are_rejected() {
        // the remainder after the first colon is not an integer
        assert!(Target::parse("example.com:8443:9").is_err());
    }
}
