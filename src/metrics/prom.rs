use chrono::{Local, NaiveDateTime};
use lazy_static::lazy_static;
use log::warn;
use prometheus::{labels, register_gauge, Gauge};

use certpeek::{CertificateSummary, DATETIME_FORMAT};

lazy_static! {
    static ref CERTPEEK_DAYS_BEFORE_EXPIRY: Gauge = register_gauge!(
        "certpeek_days_before_expiry",
        "days before certificate expiry"
    )
    .unwrap();
}

/// Pushes one expiry gauge per checked host to the push gateway.
/// # Arguments
/// * `results` - Certificate summaries from a completed run
/// * `prometheus_address` - Push gateway base address
pub fn prometheus_metrics(results: &[CertificateSummary], prometheus_address: &str) {
    for summary in results {
        let days = match days_before_expiry(&summary.expire_date) {
            Some(days) => days,
            None => {
                warn!(
                    "skipping metrics for {}: expire date '{}' not in canonical form",
                    summary.domain, summary.expire_date
                );
                continue;
            }
        };
        CERTPEEK_DAYS_BEFORE_EXPIRY.set(days);

        let metric_families = prometheus::gather();
        let prometheus_client = prometheus::push_metrics(
            "certpeek",
            labels! {
                "instance".to_owned() => "certpeek".to_owned(),
                "job".to_owned() => "certpeek".to_owned(),
                "host".to_owned() => summary.domain.to_owned(),
                "ip".to_owned() => summary.ip.to_owned(),
                "issuer".to_owned() => summary.issuer.get("O").to_owned(),
            },
            &format!("{}/metrics/job", prometheus_address),
            metric_families,
            None,
        );

        if let Err(e) = prometheus_client {
            eprintln!("\nFailed to push metrics to prometheus: {}", e);
        }
    }
}

/// Days until the given canonical local-time expiry string, fractional and
/// negative once expired.
fn days_before_expiry(expire_date: &str) -> Option<f64> {
    let naive = NaiveDateTime::parse_from_str(expire_date, DATETIME_FORMAT).ok()?;
    let expiry = naive.and_local_timezone(Local).single()?;
    let seconds = (expiry - Local::now()).num_seconds();
    Some(seconds as f64 / 86_400.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_days_before_expiry_roundtrip() {
        let expiry = Local::now() + Duration::days(30);
        let rendered = expiry.format(DATETIME_FORMAT).to_string();

        let days = days_before_expiry(&rendered).unwrap();
        assert!((days - 30.0).abs() < 0.1);
    }

    #[test]
    fn test_expired_certificates_go_negative() {
        let expiry = Local::now() - Duration::days(10);
        let rendered = expiry.format(DATETIME_FORMAT).to_string();

        let days = days_before_expiry(&rendered).unwrap();
        assert!(days < -9.0);
    }

    #[test]
    fn test_non_canonical_dates_are_skipped() {
        assert!(days_before_expiry("Jan 1 00:00:00 2030 GMT").is_none());
    }
}
