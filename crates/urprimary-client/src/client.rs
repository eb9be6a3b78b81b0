//! Primary client: owns the primary stream and pipeline, and supervises the
//! robot's control mode through the dashboard server.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use urprimary_frame::package::{
    KinematicsInfo, RobotModeData, RuntimeExceptionMessage, VersionMessage,
};
use urprimary_frame::{FrameError, FrameReader, ScriptWriter};
use urprimary_transport::{SharedStream, SocketState, Stream};

use crate::calibration::{calibration_hash, CalibrationChecker};
use crate::config::ClientConfig;
use crate::consumer::{ErrorCodeCache, PrimaryConsumer};
use crate::dashboard::{query_remote_control, DashboardConnection};
use crate::error::{ClientError, Result};
use crate::handlers::{LatestPackage, PackageHandler};
use crate::pipeline::{Notifier, Pipeline, PipelineConfig};

/// Who may command the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMode {
    /// The teach pendant has control; the primary socket is read-only.
    Local,
    /// Remote clients may send scripts.
    Remote,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Local => f.write_str("local"),
            ControlMode::Remote => f.write_str("remote"),
        }
    }
}

const MODE_UNKNOWN: u8 = 0;
const MODE_LOCAL: u8 = 1;
const MODE_REMOTE: u8 = 2;

/// State shared between the client, the control-mode thread and the
/// pipeline notifier.
#[derive(Debug, Default)]
struct ClientShared {
    control_mode: AtomicU8,
    established: AtomicBool,
    reconnect_pending: AtomicBool,
    shutdown: AtomicBool,
    reconnects: AtomicUsize,
}

impl ClientShared {
    fn control_mode(&self) -> Option<ControlMode> {
        match self.control_mode.load(Ordering::Acquire) {
            MODE_LOCAL => Some(ControlMode::Local),
            MODE_REMOTE => Some(ControlMode::Remote),
            _ => None,
        }
    }

    fn set_control_mode(&self, mode: ControlMode) {
        let value = match mode {
            ControlMode::Local => MODE_LOCAL,
            ControlMode::Remote => MODE_REMOTE,
        };
        self.control_mode.store(value, Ordering::Release);
    }
}

struct ClientNotifier {
    shared: Arc<ClientShared>,
}

impl Notifier for ClientNotifier {
    fn started(&self, name: &str) {
        debug!(pipeline = name, "primary pipeline running");
    }

    fn fault(&self, name: &str, error: &FrameError) {
        warn!(pipeline = name, error = %error, "primary stream needs reconnect");
        self.shared.reconnect_pending.store(true, Ordering::Release);
    }
}

/// Caches kinematics info and optionally checks it against an expected
/// calibration fingerprint.
struct KinematicsRecord {
    latest: Arc<LatestPackage<KinematicsInfo>>,
    checker: Option<Arc<CalibrationChecker>>,
}

impl PackageHandler<KinematicsInfo> for KinematicsRecord {
    fn handle(&self, pkg: &KinematicsInfo) {
        self.latest.handle(pkg);
        if let Some(checker) = &self.checker {
            checker.handle(pkg);
        }
    }
}

type PrimaryPipeline<S> = Pipeline<FrameReader<SharedStream<S>>, PrimaryConsumer>;

/// Client for the robot controller's primary interface.
///
/// `start()` connects the primary stream, starts the decode pipeline and
/// spawns a thread that polls the control mode over the dashboard
/// connection. Whenever the control mode flips, or the pipeline halts on a
/// stream fault, that thread stops the pipeline, reconnects the stream and
/// restarts the pipeline.
///
/// `stop()` tears down in order: polling thread, pipeline, stream.
pub struct PrimaryClient<S: Stream, D: DashboardConnection> {
    config: ClientConfig,
    stream: SharedStream<S>,
    pipeline: Arc<Mutex<PrimaryPipeline<S>>>,
    writer: Mutex<ScriptWriter<SharedStream<S>>>,
    shared: Arc<ClientShared>,
    error_code: ErrorCodeCache,
    kinematics: Arc<LatestPackage<KinematicsInfo>>,
    robot_mode: Arc<LatestPackage<RobotModeData>>,
    runtime_exception: Arc<LatestPackage<RuntimeExceptionMessage>>,
    version: Arc<LatestPackage<VersionMessage>>,
    calibration: Option<Arc<CalibrationChecker>>,
    dashboard: Option<D>,
    poller: Option<JoinHandle<D>>,
}

impl<S: Stream, D: DashboardConnection> PrimaryClient<S, D> {
    /// Build a client around a primary stream and a dashboard connection.
    /// Nothing is connected until [`start`](Self::start).
    pub fn new(stream: S, dashboard: D, config: ClientConfig) -> Self {
        let stream = SharedStream::new(stream);
        let shared = Arc::new(ClientShared::default());

        let kinematics = Arc::new(LatestPackage::<KinematicsInfo>::new());
        let robot_mode = Arc::new(LatestPackage::<RobotModeData>::new());
        let runtime_exception = Arc::new(LatestPackage::<RuntimeExceptionMessage>::new());
        let calibration = config
            .calibration_checksum
            .as_ref()
            .map(|expected| Arc::new(CalibrationChecker::new(expected.clone())));

        let mut consumer = PrimaryConsumer::new();
        consumer.set_kinematics_info_handler(Arc::new(KinematicsRecord {
            latest: Arc::clone(&kinematics),
            checker: calibration.clone(),
        }));
        consumer.set_robot_mode_handler(robot_mode.clone());
        consumer.set_runtime_exception_handler(runtime_exception.clone());
        let error_code = consumer.error_code_cache();
        let version = consumer.version_cache();

        let reader = FrameReader::with_config(stream.clone(), config.frame_config());
        let notifier = Arc::new(ClientNotifier {
            shared: Arc::clone(&shared),
        });
        let pipeline = Pipeline::with_config(
            reader,
            consumer,
            notifier,
            PipelineConfig {
                name: "urprimary pipeline".to_string(),
                stall_timeout: config.stall_timeout(),
                ..PipelineConfig::default()
            },
        );

        Self {
            writer: Mutex::new(ScriptWriter::with_timeout(
                stream.clone(),
                config.send_timeout(),
            )),
            stream,
            pipeline: Arc::new(Mutex::new(pipeline)),
            shared,
            error_code,
            kinematics,
            robot_mode,
            runtime_exception,
            version,
            calibration,
            dashboard: Some(dashboard),
            poller: None,
            config,
        }
    }

    /// Connect the primary stream, start the pipeline and the control-mode
    /// polling thread. A no-op if already started.
    pub fn start(&mut self) -> Result<()> {
        if self.poller.is_some() {
            return Ok(());
        }
        let Some(dashboard) = self.dashboard.take() else {
            return Err(ClientError::Dashboard(
                "dashboard connection was lost by a panicked control-mode thread".to_string(),
            ));
        };

        if let Err(err) = self.stream.connect() {
            self.dashboard = Some(dashboard);
            return Err(err.into());
        }
        self.shared.established.store(true, Ordering::Release);
        self.shared.reconnect_pending.store(false, Ordering::Release);
        self.shared.shutdown.store(false, Ordering::Release);
        {
            let mut pipeline = self.pipeline.lock();
            pipeline.reset_producer();
            pipeline.run()?;
        }

        let supervisor = Supervisor {
            dashboard,
            stream: self.stream.clone(),
            pipeline: Arc::clone(&self.pipeline),
            shared: Arc::clone(&self.shared),
            poll_interval: self.config.poll_interval(),
            reconnect_backoff: self.config.reconnect_backoff(),
        };
        let handle = thread::Builder::new()
            .name("urprimary control mode".to_string())
            .spawn(move || supervisor.run())?;
        self.poller = Some(handle);
        info!(host = %self.config.host, "primary client started");
        Ok(())
    }

    /// Stop polling, close the dashboard connection, stop the pipeline and
    /// close the stream.
    pub fn stop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.poller.take() {
            match handle.join() {
                Ok(dashboard) => self.dashboard = Some(dashboard),
                Err(_) => error!("control-mode thread panicked"),
            }
        }
        if let Some(dashboard) = self.dashboard.as_mut() {
            dashboard.disconnect();
        }
        self.pipeline.lock().stop();
        if self.stream.state() != SocketState::Disconnected {
            self.stream.disconnect();
            info!(host = %self.config.host, "primary client stopped");
        }
    }

    /// Send a script to the controller.
    ///
    /// A trailing line terminator is added if missing. Returns `Ok(true)` if
    /// the write succeeded and the robot was last seen in remote control,
    /// `Ok(false)` otherwise; in local control the script is still written
    /// but the controller will most likely reject it.
    ///
    /// Fails with [`ClientError::NotEstablished`] if the primary stream has
    /// never been connected.
    pub fn send_script(&self, script: &str) -> Result<bool> {
        if !self.shared.established.load(Ordering::Acquire) {
            return Err(ClientError::NotEstablished);
        }

        if let Err(err) = self.writer.lock().send(script) {
            warn!(error = %err, "could not send script");
            return Ok(false);
        }

        match self.shared.control_mode() {
            Some(ControlMode::Remote) => Ok(true),
            mode => {
                warn!(
                    mode = ?mode,
                    "script sent while the robot is not in remote control; it will likely be rejected"
                );
                Ok(false)
            }
        }
    }

    /// Last observed control mode, `None` before the first observation.
    pub fn control_mode(&self) -> Option<ControlMode> {
        self.shared.control_mode()
    }

    /// Whether the robot was last seen in remote control.
    pub fn is_remote_control(&self) -> bool {
        self.control_mode() == Some(ControlMode::Remote)
    }

    /// Wait until the control mode has been observed at least once.
    pub fn wait_for_control_mode(&self, timeout: Duration) -> Option<ControlMode> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(mode) = self.control_mode() {
                return Some(mode);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Latest error code from the controller; 0 after a text message.
    pub fn latest_error_code(&self) -> i32 {
        self.error_code.get()
    }

    /// Latest kinematics info, `None` until the first one is decoded.
    pub fn calibration(&self) -> Option<Arc<KinematicsInfo>> {
        self.kinematics.get()
    }

    /// Compare the latest kinematics info against `checksum`.
    ///
    /// `None` until kinematics info has been received.
    pub fn check_calibration(&self, checksum: &str) -> Option<bool> {
        self.calibration()
            .map(|info| calibration_hash(&info) == checksum)
    }

    /// Checker for the configured calibration checksum, if any.
    pub fn calibration_checker(&self) -> Option<&CalibrationChecker> {
        self.calibration.as_deref()
    }

    /// Latest robot mode data.
    pub fn robot_mode(&self) -> Option<Arc<RobotModeData>> {
        self.robot_mode.get()
    }

    /// Latest runtime exception raised by a script.
    pub fn last_runtime_exception(&self) -> Option<Arc<RuntimeExceptionMessage>> {
        self.runtime_exception.get()
    }

    /// Controller version banner.
    pub fn version(&self) -> Option<Arc<VersionMessage>> {
        self.version.get()
    }

    /// Connection state of the primary stream.
    pub fn connection_state(&self) -> SocketState {
        self.stream.state()
    }

    /// Number of completed reconnects of the primary stream.
    pub fn reconnect_count(&self) -> usize {
        self.shared.reconnects.load(Ordering::Acquire)
    }

    /// Whether the client is started.
    pub fn is_started(&self) -> bool {
        self.poller.is_some()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl<S: Stream, D: DashboardConnection> Drop for PrimaryClient<S, D> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<S: Stream, D: DashboardConnection> fmt::Debug for PrimaryClient<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimaryClient")
            .field("host", &self.config.host)
            .field("state", &self.stream.state())
            .field("control_mode", &self.control_mode())
            .field("reconnects", &self.reconnect_count())
            .finish()
    }
}

/// Body of the control-mode polling thread.
struct Supervisor<S: Stream, D> {
    dashboard: D,
    stream: SharedStream<S>,
    pipeline: Arc<Mutex<PrimaryPipeline<S>>>,
    shared: Arc<ClientShared>,
    poll_interval: Duration,
    reconnect_backoff: Duration,
}

impl<S: Stream, D: DashboardConnection> Supervisor<S, D> {
    fn run(mut self) -> D {
        debug!("control-mode polling started");
        let mut last_mode: Option<ControlMode> = None;
        let mut last_attempt: Option<Instant> = None;
        let mut dashboard_ok = true;

        while !self.shared.shutdown.load(Ordering::Acquire) {
            let cycle_start = Instant::now();

            match self.poll_control_mode() {
                Ok(mode) => {
                    if !dashboard_ok {
                        info!("dashboard reachable again");
                        dashboard_ok = true;
                    }
                    self.shared.set_control_mode(mode);
                    match last_mode {
                        Some(previous) if previous != mode => {
                            info!(from = %previous, to = %mode, "control mode changed, reconnecting primary stream");
                            last_attempt = Some(Instant::now());
                            self.reconnect();
                        }
                        None => debug!(mode = %mode, "initial control mode"),
                        _ => {}
                    }
                    last_mode = Some(mode);
                }
                Err(err) => {
                    if dashboard_ok {
                        warn!(error = %err, "control mode query failed");
                        dashboard_ok = false;
                    }
                }
            }

            let backoff_elapsed =
                last_attempt.is_none_or(|at| at.elapsed() >= self.reconnect_backoff);
            if self.shared.reconnect_pending.load(Ordering::Acquire) && backoff_elapsed {
                info!("primary pipeline halted, reconnecting primary stream");
                last_attempt = Some(Instant::now());
                self.reconnect();
            }

            let elapsed = cycle_start.elapsed();
            if elapsed < self.poll_interval {
                thread::sleep(self.poll_interval - elapsed);
            }
        }

        debug!("control-mode polling stopped");
        self.dashboard
    }

    fn poll_control_mode(&mut self) -> Result<ControlMode> {
        if self.dashboard.state() != SocketState::Connected {
            self.dashboard.connect()?;
        }
        let remote = query_remote_control(&mut self.dashboard)?;
        Ok(if remote {
            ControlMode::Remote
        } else {
            ControlMode::Local
        })
    }

    /// Stop the pipeline, reconnect the stream and restart the pipeline.
    fn reconnect(&self) -> bool {
        let mut pipeline = self.pipeline.lock();
        pipeline.stop();

        if let Err(err) = self.stream.reconnect() {
            warn!(error = %err, "primary stream reconnect failed");
            self.shared.reconnect_pending.store(true, Ordering::Release);
            return false;
        }
        pipeline.reset_producer();
        self.shared.reconnect_pending.store(false, Ordering::Release);

        if let Err(err) = pipeline.run() {
            error!(error = %err, "could not restart primary pipeline");
            self.shared.reconnect_pending.store(true, Ordering::Release);
            return false;
        }

        let count = self.shared.reconnects.fetch_add(1, Ordering::AcqRel) + 1;
        info!(reconnects = count, "primary stream reconnected");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use bytes::{BufMut, BytesMut};
    use urprimary_frame::{encode_frame, encode_sub_package};
    use urprimary_transport::TransportError;

    use super::*;

    /// Inbound chunk; `None` reports the connection as closed.
    type Chunk = Option<Vec<u8>>;

    #[derive(Default)]
    struct MockWire {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
        refuse: AtomicBool,
        inbound: Mutex<VecDeque<Chunk>>,
        written: Mutex<Vec<u8>>,
    }

    impl MockWire {
        fn push(&self, chunk: Chunk) {
            self.inbound.lock().push_back(chunk);
        }
    }

    struct MockStream {
        wire: Arc<MockWire>,
        state: SocketState,
    }

    impl Stream for MockStream {
        fn connect(&mut self) -> urprimary_transport::Result<()> {
            if self.wire.refuse.load(Ordering::SeqCst) {
                return Err(TransportError::Connect {
                    addr: "mock".into(),
                    source: std::io::ErrorKind::ConnectionRefused.into(),
                });
            }
            self.wire.connects.fetch_add(1, Ordering::SeqCst);
            self.state = SocketState::Connected;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.wire.disconnects.fetch_add(1, Ordering::SeqCst);
            self.state = SocketState::Disconnected;
        }

        fn state(&self) -> SocketState {
            self.state
        }

        fn read(&mut self, buf: &mut [u8]) -> urprimary_transport::Result<usize> {
            if self.state != SocketState::Connected {
                return Err(TransportError::NotConnected);
            }
            match self.wire.inbound.lock().pop_front() {
                Some(Some(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(None) => {
                    self.state = SocketState::Disconnected;
                    Err(TransportError::Closed)
                }
                None => Ok(0),
            }
        }

        fn write(&mut self, data: &[u8]) -> urprimary_transport::Result<usize> {
            if self.state != SocketState::Connected {
                return Err(TransportError::NotConnected);
            }
            self.wire.written.lock().extend_from_slice(data);
            Ok(data.len())
        }
    }

    /// Answers queued modes in order, then repeats the last one.
    #[derive(Default)]
    struct MockPanel {
        answers: Mutex<VecDeque<bool>>,
        last: AtomicBool,
        queries: AtomicUsize,
        disconnects: AtomicUsize,
    }

    struct MockDashboard {
        panel: Arc<MockPanel>,
        state: SocketState,
    }

    impl DashboardConnection for MockDashboard {
        fn connect(&mut self) -> Result<()> {
            self.state = SocketState::Connected;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.panel.disconnects.fetch_add(1, Ordering::SeqCst);
            self.state = SocketState::Disconnected;
        }

        fn state(&self) -> SocketState {
            self.state
        }

        fn send_and_receive(&mut self, command: &str) -> Result<String> {
            assert_eq!(command, crate::dashboard::REMOTE_CONTROL_QUERY);
            let remote = match self.panel.answers.lock().pop_front() {
                Some(remote) => {
                    self.panel.last.store(remote, Ordering::SeqCst);
                    remote
                }
                None => self.panel.last.load(Ordering::SeqCst),
            };
            self.panel.queries.fetch_add(1, Ordering::SeqCst);
            Ok(remote.to_string())
        }
    }

    struct Harness {
        client: PrimaryClient<MockStream, MockDashboard>,
        wire: Arc<MockWire>,
        panel: Arc<MockPanel>,
    }

    fn harness(modes: &[bool], config: ClientConfig) -> Harness {
        let wire = Arc::new(MockWire::default());
        let panel = Arc::new(MockPanel {
            answers: Mutex::new(modes.iter().copied().collect()),
            ..MockPanel::default()
        });
        let client = PrimaryClient::new(
            MockStream {
                wire: Arc::clone(&wire),
                state: SocketState::Disconnected,
            },
            MockDashboard {
                panel: Arc::clone(&panel),
                state: SocketState::Disconnected,
            },
            config,
        );
        Harness {
            client,
            wire,
            panel,
        }
    }

    fn fast_config() -> ClientConfig {
        ClientConfig {
            poll_interval_ms: 2,
            reconnect_backoff_ms: 0,
            ..ClientConfig::default()
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn frame(package_type: u8, message_type: Option<u8>, body: &[u8]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_frame(package_type, message_type, body, &mut wire).unwrap();
        wire.to_vec()
    }

    fn error_code_frame(code: i32) -> Vec<u8> {
        let mut body = BytesMut::new();
        body.put_i32(code);
        body.put_i32(0);
        body.put_i32(1);
        body.put_u8(0);
        body.put_u32(0);
        frame(20, Some(6), &body)
    }

    #[test]
    fn send_script_before_start_is_a_precondition_error() {
        let h = harness(&[true], fast_config());
        assert!(matches!(
            h.client.send_script("textmsg(1)"),
            Err(ClientError::NotEstablished)
        ));
        assert!(h.wire.written.lock().is_empty());
    }

    #[test]
    fn failed_start_leaves_client_unestablished() {
        let mut h = harness(&[true], fast_config());
        h.wire.refuse.store(true, Ordering::SeqCst);

        assert!(matches!(h.client.start(), Err(ClientError::Transport(_))));
        assert!(!h.client.is_started());
        assert!(matches!(
            h.client.send_script("x"),
            Err(ClientError::NotEstablished)
        ));

        // The dashboard is kept, so a later start can succeed.
        h.wire.refuse.store(false, Ordering::SeqCst);
        h.client.start().unwrap();
        assert!(h.client.is_started());
    }

    #[test]
    fn each_control_mode_flip_reconnects_once() {
        let mut h = harness(&[false, true, false], fast_config());
        h.client.start().unwrap();

        wait_until(|| h.panel.queries.load(Ordering::SeqCst) >= 20);
        h.client.stop();

        assert_eq!(h.client.reconnect_count(), 2);
        assert_eq!(h.wire.connects.load(Ordering::SeqCst), 3);
        assert_eq!(h.client.control_mode(), Some(ControlMode::Local));
    }

    #[test]
    fn steady_control_mode_never_reconnects() {
        let mut h = harness(&[true], fast_config());
        h.client.start().unwrap();

        wait_until(|| h.panel.queries.load(Ordering::SeqCst) >= 20);
        h.client.stop();

        assert_eq!(h.client.reconnect_count(), 0);
        assert_eq!(h.wire.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn script_gets_exactly_one_terminator() {
        let mut h = harness(&[true], fast_config());
        h.client.start().unwrap();
        assert_eq!(
            h.client.wait_for_control_mode(Duration::from_secs(5)),
            Some(ControlMode::Remote)
        );

        assert!(h.client.send_script("a").unwrap());
        assert!(h.client.send_script("a\n").unwrap());
        assert_eq!(h.wire.written.lock().as_slice(), b"a\na\n");
    }

    #[test]
    fn local_control_reports_failure_after_writing() {
        let mut h = harness(&[false], fast_config());
        h.client.start().unwrap();
        assert_eq!(
            h.client.wait_for_control_mode(Duration::from_secs(5)),
            Some(ControlMode::Local)
        );

        assert!(!h.client.send_script("popup(\"hi\")").unwrap());
        assert_eq!(h.wire.written.lock().as_slice(), b"popup(\"hi\")\n");
    }

    #[test]
    fn text_message_resets_latest_error_code() {
        let mut h = harness(&[true], fast_config());
        h.client.start().unwrap();

        h.wire.push(Some(error_code_frame(210)));
        wait_until(|| h.client.latest_error_code() == 210);

        h.wire.push(Some(vec![0, 0, 0, 9, 20, 0, b'a', b'b', b'c']));
        wait_until(|| h.client.latest_error_code() == 0);

        // 210 is diagnostic only; it never flips the control mode.
        assert_eq!(h.client.control_mode(), Some(ControlMode::Remote));
        assert_eq!(h.client.reconnect_count(), 0);
    }

    #[test]
    fn stream_loss_is_reconnected() {
        let mut h = harness(&[true], fast_config());
        h.client.start().unwrap();

        h.wire.push(None);
        wait_until(|| h.client.reconnect_count() == 1);
        assert_eq!(h.client.connection_state(), SocketState::Connected);

        // The restarted pipeline keeps decoding.
        h.wire.push(Some(error_code_frame(5)));
        wait_until(|| h.client.latest_error_code() == 5);
        h.client.stop();
        assert_eq!(h.wire.connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn silent_stream_is_reconnected() {
        let config = ClientConfig {
            stall_timeout_ms: 20,
            ..fast_config()
        };
        let mut h = harness(&[true], config);
        h.client.start().unwrap();

        // Nothing is ever pushed; the open but silent stream counts as lost.
        wait_until(|| h.client.reconnect_count() >= 1);
        h.client.stop();
        assert!(h.wire.connects.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn calibration_is_cached_and_checked() {
        let mut kinematics = BytesMut::new();
        for c in 0..6u32 {
            kinematics.put_u32(c);
        }
        for v in 0..24 {
            kinematics.put_f64(f64::from(v) * 0.1);
        }
        kinematics.put_u32(1);

        let mut body = BytesMut::new();
        encode_sub_package(5, &kinematics, &mut body);
        let state_frame = frame(16, None, &body);

        let expected = {
            let mut bp = urprimary_frame::BinParser::new(&kinematics);
            use urprimary_frame::PackageBody;
            calibration_hash(&KinematicsInfo::parse(&mut bp).unwrap())
        };

        let config = ClientConfig {
            calibration_checksum: Some(expected.clone()),
            ..fast_config()
        };
        let mut h = harness(&[true], config);
        assert!(h.client.calibration().is_none());
        assert_eq!(h.client.check_calibration(&expected), None);

        h.client.start().unwrap();
        h.wire.push(Some(state_frame));
        wait_until(|| h.client.calibration().is_some());

        assert_eq!(h.client.calibration().unwrap().calibration_status, Some(1));
        assert_eq!(h.client.check_calibration(&expected), Some(true));
        assert_eq!(h.client.check_calibration("calib_0000000000000000"), Some(false));

        let checker = h.client.calibration_checker().unwrap();
        assert!(checker.is_checked());
        assert!(checker.matches());
    }

    #[test]
    fn stop_tears_down_in_order_and_is_idempotent() {
        let mut h = harness(&[true], fast_config());
        h.client.start().unwrap();
        h.client.start().unwrap();
        assert_eq!(h.wire.connects.load(Ordering::SeqCst), 1);

        h.client.stop();
        assert!(!h.client.is_started());
        assert_eq!(h.client.connection_state(), SocketState::Disconnected);
        assert_eq!(h.wire.disconnects.load(Ordering::SeqCst), 1);
        assert!(h.panel.disconnects.load(Ordering::SeqCst) >= 1);

        h.client.stop();
        assert_eq!(h.wire.disconnects.load(Ordering::SeqCst), 1);

        // Restartable with the returned dashboard connection.
        h.client.start().unwrap();
        assert!(h.client.is_started());
    }
}
