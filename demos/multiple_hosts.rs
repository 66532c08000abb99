//! Multi-threaded certificate checking example.
//!
//! Each check is self-contained and blocking, so hosts are fanned out one
//! per thread and collected over a channel.
//!
//! Run with: cargo run --example multiple_hosts

use std::sync::mpsc;
use std::thread;

use certpeek::CertificateSummary;

fn main() {
    println!("=== Multi-Host Certificate Check ===\n");

    let hosts = vec![
        "example.com",
        "rust-lang.org",
        "crates.io",
        "self-signed.badssl.com",
        "expired.badssl.com",
    ];

    let (tx, rx) = mpsc::channel();

    for host in hosts {
        let tx = tx.clone();
        thread::spawn(move || {
            let result = CertificateSummary::from(host);
            tx.send((host, result)).unwrap();
        });
    }

    // Drop the original sender so the receiver knows when all threads are done
    drop(tx);

    let mut results: Vec<_> = rx.iter().collect();
    results.sort_by_key(|(host, _)| *host);

    println!("{:<28} {:<18} {}", "Host", "Expires", "Issuer");
    println!("{}", "=".repeat(70));

    for (host, result) in results {
        match result {
            Ok(summary) => {
                println!(
                    "{:<28} {:<18} {}",
                    host,
                    summary.expire_date,
                    summary.issuer.get("O")
                );
            }
            Err(e) => {
                println!("{:<28} {}", host, e);
            }
        }
    }
}
