use std::fs;
use std::path::Path;

use tracing::warn;
use urprimary_client::connect_with_config;

use crate::cmd::{parse_duration, resolve_config, SendArgs};
use crate::exit::{client_error, io_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::output::{print_send, OutputFormat, SendOutput};

pub fn run(args: SendArgs, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    let script = resolve_script(&args)?;
    let wait = parse_duration(&args.wait_remote)?;
    let config = resolve_config(config, &args.host, args.port, args.dashboard_port)?;
    let host = config.host.clone();

    let mut client =
        connect_with_config(config).map_err(|err| client_error("connect failed", err))?;

    let mode = client.wait_for_control_mode(wait);
    if mode.is_none() {
        warn!(wait = ?wait, "control mode not observed; sending anyway");
    }

    let accepted = client
        .send_script(&script)
        .map_err(|err| client_error("send failed", err))?;

    let out = SendOutput {
        host,
        bytes: script.len(),
        control_mode: mode.map(|mode| mode.to_string()),
        accepted,
        latest_error_code: client.latest_error_code(),
    };
    client.stop();

    print_send(&out, format);
    Ok(if accepted { SUCCESS } else { FAILURE })
}

fn resolve_script(args: &SendArgs) -> CliResult<String> {
    if let Some(script) = &args.script {
        return Ok(script.clone());
    }
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::new(USAGE, "one of --script or --file is required"))
}
