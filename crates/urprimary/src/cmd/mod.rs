use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand};
use urprimary_client::ClientConfig;

use crate::exit::{client_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod send;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream decoded packages from the primary interface.
    Watch(WatchArgs),
    /// Upload a script through the primary client.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format, config),
        Command::Send(args) => send::run(args, format, config),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Controller host name or address.
    pub host: String,
    /// Primary interface port. Overrides the config file.
    #[arg(long)]
    pub port: Option<u16>,
    /// Only print packages of these kinds (comma-separated, e.g. text_message,error_code_message).
    #[arg(long, value_delimiter = ',')]
    pub kinds: Option<Vec<String>>,
    /// Exit after printing N packages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Controller host name or address.
    pub host: String,
    /// Script source.
    #[arg(long, conflicts_with = "file")]
    pub script: Option<String>,
    /// Read the script from a file.
    #[arg(long, conflicts_with = "script")]
    pub file: Option<PathBuf>,
    /// Primary interface port. Overrides the config file.
    #[arg(long)]
    pub port: Option<u16>,
    /// Dashboard server port. Overrides the config file.
    #[arg(long)]
    pub dashboard_port: Option<u16>,
    /// How long to wait for the control mode to be observed (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub wait_remote: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Load `path` (or defaults) and apply command-line overrides.
pub fn resolve_config(
    path: Option<&Path>,
    host: &str,
    port: Option<u16>,
    dashboard_port: Option<u16>,
) -> CliResult<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::load(path)
            .map_err(|err| client_error(&format!("failed loading {}", path.display()), err))?,
        None => ClientConfig::default(),
    };
    config.host = host.to_string();
    if let Some(port) = port {
        config.primary_port = port;
    }
    if let Some(port) = dashboard_port {
        config.dashboard_port = port;
    }
    Ok(config)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn flags_override_config_file() {
        let path = std::env::temp_dir().join(format!("urprimary-config-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"host": "file-host", "primary_port": 40001, "dashboard_port": 40002, "poll_interval_ms": 10}"#,
        )
        .unwrap();

        let config = resolve_config(Some(&path), "robot", Some(30011), None).unwrap();
        assert_eq!(config.host, "robot");
        assert_eq!(config.primary_port, 30011);
        assert_eq!(config.dashboard_port, 40002);
        assert_eq!(config.poll_interval_ms, 10);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = resolve_config(Some(Path::new("/nonexistent/urprimary.json")), "robot", None, None)
            .unwrap_err();
        assert!(err.message.contains("/nonexistent/urprimary.json"));
    }
}
