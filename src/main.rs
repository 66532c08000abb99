use std::path::PathBuf;
use std::process::exit;
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use log::warn;
use strum_macros::{Display, EnumString};
use url::Url;

use certpeek::config::Config;
use certpeek::CertificateSummary;

mod metrics;

#[derive(Parser, Debug)]
#[command(name = "certpeek", version, about, long_about = None)]
struct Cli {
    /// Hosts to check, as "host" or "host:port"
    #[arg(value_name = "HOST")]
    hosts: Vec<String>,

    /// Output format: text, json or table
    #[arg(short, long, value_name = "FORMAT")]
    output: Option<String>,

    /// Read hosts and defaults from a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Process exit code to use when any check fails
    #[arg(long, value_name = "CODE")]
    exit_code: Option<i32>,

    /// Push expiry metrics to a Prometheus push gateway
    #[arg(long)]
    prometheus: bool,

    /// Push gateway address, e.g. http://localhost:9091
    #[arg(long, value_name = "ADDRESS")]
    prometheus_address: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
enum OutputFormat {
    Text,
    Json,
    Table,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.init_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    let mut config = Config::default();
    if let Some(path) = &cli.config {
        match Config::from_file(path) {
            Ok(file_config) => config = config.merge_with(file_config),
            Err(e) => {
                eprintln!("Failed to load configuration {}: {}", path.display(), e);
                exit(2);
            }
        }
    }
    let cli_hosts = if cli.hosts.is_empty() {
        None
    } else {
        Some(cli.hosts.clone())
    };
    config = config.merge_with(Config::from_cli_args(
        cli_hosts,
        cli.output.clone(),
        cli.exit_code,
        cli.prometheus.then_some(true),
        cli.prometheus_address.clone(),
    ));

    let hosts = match config.hosts {
        Some(hosts) if !hosts.is_empty() => hosts,
        _ => {
            eprintln!("No hosts to check; pass them as arguments or via --config");
            exit(2);
        }
    };

    let format = config
        .output
        .as_deref()
        .map(|name| {
            OutputFormat::from_str(name).unwrap_or_else(|_| {
                warn!("unknown output format '{}', using table", name);
                OutputFormat::Table
            })
        })
        .unwrap_or(OutputFormat::Table);

    let (sender, receiver) = mpsc::channel();
    for host in hosts {
        let sender = sender.clone();
        thread::spawn(move || {
            let input = strip_scheme(&host);
            let result = CertificateSummary::from(&input);
            sender.send((host, result)).unwrap();
        });
    }
    drop(sender);

    let mut summaries: Vec<CertificateSummary> = Vec::new();
    let mut failures = 0;
    for (host, result) in receiver {
        match result {
            Ok(summary) => summaries.push(summary),
            Err(err) => {
                failures += 1;
                eprintln!("Failed to check {}: {}", host, err);
            }
        }
    }
    summaries.sort_by(|a, b| a.domain.cmp(&b.domain));

    match format {
        OutputFormat::Text => print_text(&summaries),
        OutputFormat::Json => print_json(&summaries),
        OutputFormat::Table => print_table(&summaries),
    }

    if let Some(prom) = &config.prometheus {
        if prom.enabled.unwrap_or(false) {
            let address = prom
                .address
                .clone()
                .unwrap_or_else(|| "http://localhost:9091".to_string());
            metrics::prom::prometheus_metrics(&summaries, &address);
        }
    }

    if failures > 0 {
        exit(config.exit_code.unwrap_or(0));
    }
}

/// Accepts "https://host:port" style targets by reducing them to the
/// "host[:port]" form the library expects. Everything else passes through
/// untouched.
fn strip_scheme(input: &str) -> String {
    if !input.contains("://") {
        return input.to_string();
    }
    match Url::parse(input) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => input.to_string(),
        },
        Err(_) => input.to_string(),
    }
}

fn print_text(summaries: &[CertificateSummary]) {
    for summary in summaries {
        println!("--------------------------------------");
        println!("Domain: {}", summary.domain);
        println!("IP: {}", summary.ip);
        println!("Subject:");
        println!("\tCountry or Region: {}", summary.subject.get("C"));
        println!("\tState or Province: {}", summary.subject.get("ST"));
        println!("\tLocality: {}", summary.subject.get("L"));
        println!("\tOrganizational Unit: {}", summary.subject.get("OU"));
        println!("\tOrganization: {}", summary.subject.get("O"));
        println!("\tCommon Name: {}", summary.subject.get("CN"));
        println!("Issuer:");
        println!("\tCountry or Region: {}", summary.issuer.get("C"));
        println!("\tOrganization: {}", summary.issuer.get("O"));
        println!("\tCommon Name: {}", summary.issuer.get("CN"));
        println!("Valid from: {}", summary.start_date);
        println!("Expires: {}", summary.expire_date);
    }
}

fn print_json(summaries: &[CertificateSummary]) {
    match serde_json::to_string_pretty(summaries) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize results: {}", e),
    }
}

fn print_table(summaries: &[CertificateSummary]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Domain",
            "IP",
            "Subject CN",
            "Issuer",
            "Valid From",
            "Expires",
        ]);

    for summary in summaries {
        let issuer = if summary.issuer.get("O").is_empty() {
            summary.issuer.get("CN")
        } else {
            summary.issuer.get("O")
        };
        table.add_row(vec![
            summary.domain.as_str(),
            summary.ip.as_str(),
            summary.subject.get("CN"),
            issuer,
            summary.start_date.as_str(),
            summary.expire_date.as_str(),
        ]);
    }

    println!("{table}");
}
