mod cmd;
mod exit;
mod logging;
mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "urprimary", version, about = "Robot controller primary interface CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// JSON client configuration file. Command-line flags take precedence.
    #[arg(long, value_name = "FILE", global = true, env = "URPRIMARY_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format, cli.config.as_deref());

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "urprimary",
            "send",
            "192.168.56.101",
            "--script",
            "textmsg(\"hi\")",
            "--wait-remote",
            "500ms",
        ])
        .expect("send args should parse");

        assert!(matches!(cli.command, Command::Send(_)));
    }

    #[test]
    fn rejects_conflicting_script_args() {
        let err = Cli::try_parse_from([
            "urprimary",
            "send",
            "robot",
            "--script",
            "x",
            "--file",
            "prog.script",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_watch_filters() {
        let cli = Cli::try_parse_from([
            "urprimary",
            "--format",
            "json",
            "watch",
            "robot",
            "--kinds",
            "text_message,error_code_message",
            "--count",
            "3",
        ])
        .expect("watch args should parse");

        let Command::Watch(args) = cli.command else {
            panic!("expected watch");
        };
        assert_eq!(
            args.kinds.as_deref(),
            Some(&["text_message".to_string(), "error_code_message".to_string()][..])
        );
        assert_eq!(args.count, Some(3));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
