use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use urprimary_client::{Notifier, Pipeline, PipelineConfig};
use urprimary_frame::package::{
    CartesianInfo, ErrorCodeMessage, ForceModeData, GlobalVariablesSetupMessage,
    GlobalVariablesUpdateMessage, JointData, KeyMessage, KinematicsInfo, ProgramLabelMessage,
    RobotModeData, RuntimeExceptionMessage, SafetyModeMessage, TextMessage, VersionMessage,
};
use urprimary_frame::{FrameError, FrameReader, Package, PackageConsumer, UndecodedPackage};
use urprimary_transport::{SharedStream, TcpTransport};

use crate::cmd::{resolve_config, WatchArgs};
use crate::exit::{transport_error, CliError, CliResult, DATA_INVALID, FAILURE, INTERNAL, SUCCESS, TIMEOUT};
use crate::output::{print_package, OutputFormat};

enum Event {
    Package(Package),
    Halted(CliError),
}

/// Forwards every decoded package to the printing thread.
struct ChannelConsumer {
    tx: Sender<Event>,
}

impl ChannelConsumer {
    fn forward(&self, pkg: Package) -> bool {
        self.tx.send(Event::Package(pkg)).is_ok()
    }
}

macro_rules! forward_slots {
    ($($slot:ident($ty:ty) => $variant:ident),* $(,)?) => {
        $(
            fn $slot(&mut self, pkg: &$ty) -> bool {
                self.forward(Package::$variant(pkg.clone()))
            }
        )*
    };
}

impl PackageConsumer for ChannelConsumer {
    forward_slots! {
        consume_robot_mode_data(RobotModeData) => RobotModeData,
        consume_joint_data(JointData) => JointData,
        consume_cartesian_info(CartesianInfo) => CartesianInfo,
        consume_kinematics_info(KinematicsInfo) => KinematicsInfo,
        consume_force_mode_data(ForceModeData) => ForceModeData,
        consume_text_message(TextMessage) => TextMessage,
        consume_program_label_message(ProgramLabelMessage) => ProgramLabelMessage,
        consume_version_message(VersionMessage) => VersionMessage,
        consume_safety_mode_message(SafetyModeMessage) => SafetyModeMessage,
        consume_error_code_message(ErrorCodeMessage) => ErrorCodeMessage,
        consume_key_message(KeyMessage) => KeyMessage,
        consume_runtime_exception_message(RuntimeExceptionMessage) => RuntimeExceptionMessage,
        consume_global_variables_setup_message(GlobalVariablesSetupMessage) => GlobalVariablesSetupMessage,
        consume_global_variables_update_message(GlobalVariablesUpdateMessage) => GlobalVariablesUpdateMessage,
        consume_undecoded(UndecodedPackage) => Undecoded,
    }
}

struct HaltNotifier {
    tx: Sender<Event>,
}

impl Notifier for HaltNotifier {
    fn fault(&self, _name: &str, error: &FrameError) {
        let code = match error {
            FrameError::Stalled { .. } => TIMEOUT,
            err if err.is_framing_fault() => DATA_INVALID,
            _ => FAILURE,
        };
        let _ = self
            .tx
            .send(Event::Halted(CliError::new(code, format!("watch stopped: {error}"))));
    }
}

pub fn run(args: WatchArgs, format: OutputFormat, config: Option<&Path>) -> CliResult<i32> {
    let config = resolve_config(config, &args.host, args.port, None)?;

    let stream = SharedStream::new(TcpTransport::with_config(
        config.host.clone(),
        config.primary_port,
        config.tcp_config(),
    ));
    stream
        .connect()
        .map_err(|err| transport_error("connect failed", err))?;

    let (tx, rx) = mpsc::channel();
    let reader = FrameReader::with_config(stream.clone(), config.frame_config());
    let mut pipeline = Pipeline::with_config(
        reader,
        ChannelConsumer { tx: tx.clone() },
        Arc::new(HaltNotifier { tx }),
        PipelineConfig {
            name: "urprimary watch".to_string(),
            stall_timeout: config.stall_timeout(),
            ..PipelineConfig::default()
        },
    );
    pipeline
        .run()
        .map_err(|err| CliError::new(INTERNAL, format!("pipeline start failed: {err}")))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0usize;
    let mut result = Ok(SUCCESS);
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Event::Package(pkg)) => {
                if let Some(kinds) = &args.kinds {
                    if !kinds.iter().any(|kind| kind == pkg.kind()) {
                        continue;
                    }
                }
                print_package(&pkg, &config.host, format);
                printed = printed.saturating_add(1);
                if args.count.is_some_and(|count| printed >= count) {
                    break;
                }
            }
            Ok(Event::Halted(err)) => {
                result = Err(err);
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    pipeline.stop();
    stream.disconnect();
    result
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
