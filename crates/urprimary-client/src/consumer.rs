use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use urprimary_frame::package::{
    ErrorCodeMessage, GlobalVariablesSetupMessage, GlobalVariablesUpdateMessage, KeyMessage,
    KinematicsInfo, ProgramLabelMessage, RobotModeData, RuntimeExceptionMessage,
    SafetyModeMessage, TextMessage, VersionMessage,
};
use urprimary_frame::PackageConsumer;

use crate::handlers::{ErrorCodeLogger, KeyMessageLogger, LatestPackage, PackageHandler};

/// Notification code the controller sends when a script arrives on a
/// read-only primary socket (robot in local control).
pub const READ_ONLY_SOCKET_CODE: i32 = 210;

/// Latest error code seen by a [`PrimaryConsumer`], readable from any thread.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeCache {
    code: Arc<AtomicI32>,
}

impl ErrorCodeCache {
    /// The most recent error code, or 0 if a text message has arrived since.
    pub fn get(&self) -> i32 {
        self.code.load(Ordering::Acquire)
    }

    fn set(&self, code: i32) {
        self.code.store(code, Ordering::Release);
    }

    fn reset(&self) {
        self.set(0);
    }
}

/// The general-purpose consumer behind [`PrimaryClient`](crate::PrimaryClient).
///
/// Tracks the latest error code (reset by every text message), logs robot
/// messages, and forwards selected variants to registered handlers.
pub struct PrimaryConsumer {
    latest_error_code: ErrorCodeCache,
    version: Arc<LatestPackage<VersionMessage>>,
    key_message_handler: Option<Arc<dyn PackageHandler<KeyMessage>>>,
    error_code_handler: Option<Arc<dyn PackageHandler<ErrorCodeMessage>>>,
    kinematics_info_handler: Option<Arc<dyn PackageHandler<KinematicsInfo>>>,
    robot_mode_handler: Option<Arc<dyn PackageHandler<RobotModeData>>>,
    runtime_exception_handler: Option<Arc<dyn PackageHandler<RuntimeExceptionMessage>>>,
}

impl PrimaryConsumer {
    /// A consumer that logs key and error code messages.
    pub fn new() -> Self {
        Self {
            latest_error_code: ErrorCodeCache::default(),
            version: Arc::new(LatestPackage::new()),
            key_message_handler: Some(Arc::new(KeyMessageLogger)),
            error_code_handler: Some(Arc::new(ErrorCodeLogger)),
            kinematics_info_handler: None,
            robot_mode_handler: None,
            runtime_exception_handler: None,
        }
    }

    pub fn set_key_message_handler(&mut self, handler: Arc<dyn PackageHandler<KeyMessage>>) {
        self.key_message_handler = Some(handler);
    }

    pub fn set_error_code_handler(&mut self, handler: Arc<dyn PackageHandler<ErrorCodeMessage>>) {
        self.error_code_handler = Some(handler);
    }

    pub fn set_kinematics_info_handler(
        &mut self,
        handler: Arc<dyn PackageHandler<KinematicsInfo>>,
    ) {
        self.kinematics_info_handler = Some(handler);
    }

    pub fn set_robot_mode_handler(&mut self, handler: Arc<dyn PackageHandler<RobotModeData>>) {
        self.robot_mode_handler = Some(handler);
    }

    pub fn set_runtime_exception_handler(
        &mut self,
        handler: Arc<dyn PackageHandler<RuntimeExceptionMessage>>,
    ) {
        self.runtime_exception_handler = Some(handler);
    }

    /// Shared handle to the latest error code.
    pub fn error_code_cache(&self) -> ErrorCodeCache {
        self.latest_error_code.clone()
    }

    /// The latest error code, 0 if reset by a text message.
    pub fn latest_error_code(&self) -> i32 {
        self.latest_error_code.get()
    }

    /// Reset the latest error code to 0.
    pub fn reset_latest_error_code(&self) {
        self.latest_error_code.reset();
    }

    /// Shared handle to the controller version banner.
    pub fn version_cache(&self) -> Arc<LatestPackage<VersionMessage>> {
        Arc::clone(&self.version)
    }
}

impl Default for PrimaryConsumer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PrimaryConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrimaryConsumer")
            .field("latest_error_code", &self.latest_error_code.get())
            .field("kinematics_handler", &self.kinematics_info_handler.is_some())
            .finish()
    }
}

fn forward<T: 'static>(handler: &Option<Arc<dyn PackageHandler<T>>>, pkg: &T) -> bool {
    match handler {
        Some(handler) => {
            handler.handle(pkg);
            true
        }
        None => false,
    }
}

impl PackageConsumer for PrimaryConsumer {
    fn consume_robot_mode_data(&mut self, pkg: &RobotModeData) -> bool {
        forward(&self.robot_mode_handler, pkg)
    }

    fn consume_kinematics_info(&mut self, pkg: &KinematicsInfo) -> bool {
        forward(&self.kinematics_info_handler, pkg)
    }

    fn consume_text_message(&mut self, pkg: &TextMessage) -> bool {
        self.latest_error_code.reset();
        debug!(text = %pkg.text, "text message");
        true
    }

    fn consume_program_label_message(&mut self, pkg: &ProgramLabelMessage) -> bool {
        debug!(id = pkg.id, label = %pkg.label, "program label");
        true
    }

    fn consume_version_message(&mut self, pkg: &VersionMessage) -> bool {
        info!(
            project = %pkg.project_name,
            version = %pkg.version_string(),
            build_date = %pkg.build_date,
            "controller version"
        );
        self.version.handle(pkg);
        true
    }

    fn consume_safety_mode_message(&mut self, pkg: &SafetyModeMessage) -> bool {
        info!(
            code = pkg.message_code,
            argument = pkg.message_argument,
            safety_mode = pkg.safety_mode_type,
            "safety mode changed"
        );
        true
    }

    fn consume_error_code_message(&mut self, pkg: &ErrorCodeMessage) -> bool {
        self.latest_error_code.set(pkg.message_code);
        if pkg.message_code == READ_ONLY_SOCKET_CODE {
            warn!(
                code = pkg.message_code,
                "controller rejected a script: primary socket is read-only in local control"
            );
        }
        forward(&self.error_code_handler, pkg)
    }

    fn consume_key_message(&mut self, pkg: &KeyMessage) -> bool {
        forward(&self.key_message_handler, pkg)
    }

    fn consume_runtime_exception_message(&mut self, pkg: &RuntimeExceptionMessage) -> bool {
        warn!(
            line = pkg.line_number,
            column = pkg.column_number,
            "runtime exception: {}",
            pkg.text
        );
        forward(&self.runtime_exception_handler, pkg);
        true
    }

    fn consume_global_variables_setup_message(&mut self, pkg: &GlobalVariablesSetupMessage) -> bool {
        debug!(
            start = pkg.start_index,
            names = pkg.variable_names.len(),
            "global variables announced"
        );
        true
    }

    fn consume_global_variables_update_message(
        &mut self,
        pkg: &GlobalVariablesUpdateMessage,
    ) -> bool {
        debug!(
            start = pkg.start_index,
            len = pkg.values.len(),
            "global variables updated"
        );
        true
    }
}
