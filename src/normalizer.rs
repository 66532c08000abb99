//! Certificate field normalization.
//!
//! Flattens the nested distinguished-name shape of a [`RawCertificate`]
//! into flat short-code mappings and converts the vendor's validity
//! timestamps into the canonical local-time rendering.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;
use crate::fetcher::RawCertificate;
use crate::CertificateSummary;

/// Canonical rendering for certificate validity bounds, in local time.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Short attribute codes and the long X.509 names they are filled from.
const NAME_TABLE: &[(&str, &str)] = &[
    ("C", "countryName"),
    ("CN", "commonName"),
    ("O", "organizationName"),
    ("OU", "organizationalUnitName"),
    ("L", "localityName"),
    ("ST", "stateOrProvinceName"),
];

/// Timestamp shapes certificates present in the wild: OpenSSL's textual
/// form (with and without the zone suffix) and raw ASN.1 GeneralizedTime.
/// All are zone-explicit or implicitly UTC.
const VENDOR_TIMESTAMP_FORMATS: &[&str] = &[
    "%b %e %H:%M:%S %Y GMT",
    "%b %e %H:%M:%S %Y",
    "%Y%m%d%H%M%SZ",
];

/// Subject or issuer name, keyed by short attribute code.
///
/// All six codes (`C`, `CN`, `O`, `OU`, `L`, `ST`) are always present;
/// attributes the certificate does not carry map to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistinguishedName(BTreeMap<String, String>);

impl DistinguishedName {
    /// Re-keys a flat long-name mapping into short-code form.
    pub(crate) fn from_long_names(attributes: &HashMap<String, String>) -> Self {
        Self::with_table(attributes, NAME_TABLE)
    }

    fn with_table(attributes: &HashMap<String, String>, table: &[(&str, &str)]) -> Self {
        let mut entries = BTreeMap::new();
        for (code, long_name) in table {
            let value = attributes.get(*long_name).cloned().unwrap_or_default();
            entries.insert(code.to_string(), value);
        }
        DistinguishedName(entries)
    }

    /// Looks up an attribute by short code, yielding `""` for codes the
    /// name does not carry.
    pub fn get(&self, code: &str) -> &str {
        self.0.get(code).map(String::as_str).unwrap_or("")
    }
}

/// Converts a raw certificate into the flat output record.
///
/// `original_input` is the full `host[:port]` string the check was asked
/// for and is carried through verbatim as the summary's `domain`.
pub fn normalize(
    raw: &RawCertificate,
    ip: &str,
    original_input: &str,
) -> Result<CertificateSummary, CheckError> {
    let subject = DistinguishedName::from_long_names(&flatten_rdn_groups(&raw.subject));
    let issuer = DistinguishedName::from_long_names(&flatten_rdn_groups(&raw.issuer));

    let start_date = to_local_string(parse_vendor_timestamp(&raw.not_before)?);
    let expire_date = to_local_string(parse_vendor_timestamp(&raw.not_after)?);

    Ok(CertificateSummary {
        domain: original_input.to_string(),
        ip: ip.to_string(),
        subject,
        issuer,
        start_date,
        expire_date,
    })
}

/// Flattens a sequence of one-pair RDN groups into a long-name mapping.
///
/// Later entries win on duplicate attribute names, matching the
/// left-to-right build order of the group sequence. Groups with zero or
/// multiple pairs violate the source's one-pair shape and are skipped.
pub(crate) fn flatten_rdn_groups(groups: &[Vec<(String, String)>]) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for group in groups {
        if group.len() != 1 {
            warn!(
                "skipping distinguished-name group with {} pairs",
                group.len()
            );
            continue;
        }
        let (name, value) = &group[0];
        attributes.insert(name.clone(), value.clone());
    }
    attributes
}

/// Parses a vendor validity timestamp into an instant.
pub(crate) fn parse_vendor_timestamp(value: &str) -> Result<DateTime<Utc>, CheckError> {
    let trimmed = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    for format in VENDOR_TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(CheckError::TimestampParse {
        value: value.to_string(),
    })
}

fn to_local_string(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format(DATETIME_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn one_pair_groups(pairs: &[(&str, &str)]) -> Vec<Vec<(String, String)>> {
        pairs
            .iter()
            .map(|(name, value)| vec![(name.to_string(), value.to_string())])
            .collect()
    }

    #[test]
    fn test_flatten_builds_long_name_mapping() {
        let groups = one_pair_groups(&[
            ("countryName", "US"),
            ("commonName", "example.com"),
        ]);
        let attributes = flatten_rdn_groups(&groups);
        assert_eq!(attributes.get("countryName").unwrap(), "US");
        assert_eq!(attributes.get("commonName").unwrap(), "example.com");
    }

    #[test]
    fn test_flatten_last_write_wins_on_duplicates() {
        let groups = one_pair_groups(&[
            ("organizationalUnitName", "first"),
            ("organizationalUnitName", "second"),
        ]);
        let attributes = flatten_rdn_groups(&groups);
        assert_eq!(attributes.get("organizationalUnitName").unwrap(), "second");
    }

    #[test]
    fn test_flatten_skips_malformed_groups() {
        let mut groups = one_pair_groups(&[("commonName", "example.com")]);
        groups.push(vec![]);
        groups.push(vec![
            ("localityName".to_string(), "a".to_string()),
            ("stateOrProvinceName".to_string(), "b".to_string()),
        ]);

        let attributes = flatten_rdn_groups(&groups);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes.get("commonName").unwrap(), "example.com");
    }

    #[test]
    fn test_rekeying_always_yields_all_six_codes() {
        let mut attributes = HashMap::new();
        attributes.insert("commonName".to_string(), "example.com".to_string());
        attributes.insert("organizationName".to_string(), "Example Inc".to_string());

        let name = DistinguishedName::from_long_names(&attributes);
        assert_eq!(name.get("CN"), "example.com");
        assert_eq!(name.get("O"), "Example Inc");
        for absent in ["C", "OU", "L", "ST"] {
            assert_eq!(name.get(absent), "");
        }

        let json = serde_json::to_value(&name).unwrap();
        let mut keys: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["C", "CN", "L", "O", "OU", "ST"]);
    }

    #[test]
    fn test_rekeying_ignores_unmapped_long_names() {
        let mut attributes = HashMap::new();
        attributes.insert("serialNumber".to_string(), "12345".to_string());
        attributes.insert("commonName".to_string(), "example.com".to_string());

        let name = DistinguishedName::from_long_names(&attributes);
        assert_eq!(name.get("CN"), "example.com");
        assert_eq!(name.get("serialNumber"), "");
    }

    #[test]
    fn test_substitute_table() {
        let mut attributes = HashMap::new();
        attributes.insert("emailAddress".to_string(), "ops@example.com".to_string());

        let name = DistinguishedName::with_table(&attributes, &[("E", "emailAddress")]);
        assert_eq!(name.get("E"), "ops@example.com");
    }

    #[test]
    fn test_openssl_text_timestamp_parses_to_exact_instant() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            parse_vendor_timestamp("Jan 1 00:00:00 2030 GMT").unwrap(),
            expected
        );
        // openssl pads single-digit days with a space
        assert_eq!(
            parse_vendor_timestamp("Jan  1 00:00:00 2030 GMT").unwrap(),
            expected
        );
    }

    #[test]
    fn test_other_vendor_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            parse_vendor_timestamp("Tue, 1 Jan 2030 00:00:00 +0000").unwrap(),
            expected
        );
        assert_eq!(
            parse_vendor_timestamp("20300101000000Z").unwrap(),
            expected
        );
    }

    #[test]
    fn test_canonical_rendering_shape() {
        let instant = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let rendered = to_local_string(instant);

        assert_eq!(rendered.len(), 19);
        for (i, c) in rendered.char_indices() {
            match i {
                4 | 7 => assert_eq!(c, '-'),
                10 => assert_eq!(c, ' '),
                13 | 16 => assert_eq!(c, ':'),
                _ => assert!(c.is_ascii_digit(), "unexpected char {:?} at {}", c, i),
            }
        }
    }

    #[test]
    fn test_unparseable_timestamp_is_an_error() {
        match parse_vendor_timestamp("sometime next year") {
            Err(CheckError::TimestampParse { value }) => {
                assert_eq!(value, "sometime next year");
            }
            other => panic!("expected TimestampParse, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_round_trips_original_input() {
        let raw = RawCertificate {
            subject: one_pair_groups(&[("commonName", "example.com")]),
            issuer: one_pair_groups(&[
                ("countryName", "US"),
                ("organizationName", "Example CA"),
                ("commonName", "Example CA Root"),
            ]),
            not_before: "Jan  1 00:00:00 2020 GMT".to_string(),
            not_after: "Jan  1 00:00:00 2030 GMT".to_string(),
        };

        let summary = normalize(&raw, "93.184.216.34", "example.com:8443").unwrap();
        assert_eq!(summary.domain, "example.com:8443");
        assert_eq!(summary.ip, "93.184.216.34");
        assert_eq!(summary.subject.get("CN"), "example.com");
        assert_eq!(summary.subject.get("O"), "");
        assert_eq!(summary.issuer.get("O"), "Example CA");
        assert_eq!(summary.issuer.get("CN"), "Example CA Root");
    }

    #[test]
    fn test_normalize_fails_on_bad_validity_bound() {
        let raw = RawCertificate {
            subject: one_pair_groups(&[("commonName", "example.com")]),
            issuer: one_pair_groups(&[("commonName", "Example CA")]),
            not_before: "garbage".to_string(),
            not_after: "Jan  1 00:00:00 2030 GMT".to_string(),
        };

        assert!(matches!(
            normalize(&raw, "203.0.113.7", "example.com"),
            Err(CheckError::TimestampParse { .. })
        ));
    }

    #[test]
    fn test_summary_serializes_with_exact_field_set() {
        let raw = RawCertificate {
            subject: one_pair_groups(&[("commonName", "example.com")]),
            issuer: one_pair_groups(&[("commonName", "Example CA")]),
            not_before: "Jan  1 00:00:00 2020 GMT".to_string(),
            not_after: "Jan  1 00:00:00 2030 GMT".to_string(),
        };
        let summary = normalize(&raw, "203.0.113.7", "example.com").unwrap();

        let json = serde_json::to_value(&summary).unwrap();
        let mut keys: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["domain", "expire_date", "ip", "issuer", "start_date", "subject"]
        );
    }
}
