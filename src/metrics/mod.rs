//! Metrics export for certificate checks.
//!
//! Pushes expiry gauges to a Prometheus Push Gateway so a scrape-based
//! monitoring stack can alert on certificates nearing expiry.

pub mod prom;
