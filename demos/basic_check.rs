//! Basic certificate summary example.
//!
//! Fetches the certificate one host presents and prints the normalized
//! summary fields.
//!
//! Run with: cargo run --example basic_check

use certpeek::CertificateSummary;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Basic Certificate Check ===\n");

    let summary = CertificateSummary::from("example.com")?;

    println!("Domain: {}", summary.domain);
    println!("IP: {}", summary.ip);
    println!("Subject CN: {}", summary.subject.get("CN"));
    println!("Issuer: {}", summary.issuer.get("O"));
    println!("Valid from: {}", summary.start_date);
    println!("Expires: {}", summary.expire_date);

    Ok(())
}
