use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use urprimary_frame::Package;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PackageOutput<'a> {
    host: &'a str,
    timestamp: String,
    #[serde(flatten)]
    package: &'a Package,
}

pub fn print_package(pkg: &Package, host: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PackageOutput {
                host,
                timestamp: now_unix_seconds(),
                package: pkg,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "HOST", "PACKAGE"])
                .add_row(vec![pkg.kind().to_string(), host.to_string(), pkg.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{:<28} {}", pkg.kind(), pkg);
        }
    }
}

#[derive(Serialize)]
pub struct SendOutput {
    pub host: String,
    pub bytes: usize,
    pub control_mode: Option<String>,
    pub accepted: bool,
    pub latest_error_code: i32,
}

pub fn print_send(out: &SendOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["HOST", "BYTES", "CONTROL MODE", "ACCEPTED", "ERROR CODE"])
                .add_row(vec![
                    out.host.clone(),
                    out.bytes.to_string(),
                    out.control_mode.as_deref().unwrap_or("unknown").to_string(),
                    out.accepted.to_string(),
                    out.latest_error_code.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "host={} bytes={} control_mode={} accepted={} error_code={}",
                out.host,
                out.bytes,
                out.control_mode.as_deref().unwrap_or("unknown"),
                out.accepted,
                out.latest_error_code
            );
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
