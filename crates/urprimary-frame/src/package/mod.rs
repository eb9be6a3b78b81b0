//! Typed packages decoded from primary interface frames.
//!
//! [`Package`] is a closed sum over every decodable variant plus
//! [`UndecodedPackage`] for frames with no decoder. Dispatch to a
//! [`PackageConsumer`] is a single exhaustive match.

mod program_state;
mod robot_message;
mod robot_state;

use std::fmt;

use bytes::Bytes;
use tracing::debug;

pub use program_state::{GlobalVariablesSetupMessage, GlobalVariablesUpdateMessage, ProgramStateType};
pub use robot_message::{
    ErrorCodeMessage, KeyMessage, ProgramLabelMessage, RobotMessageType, RuntimeExceptionMessage,
    SafetyModeMessage, TextMessage, VersionMessage,
};
pub use robot_state::{
    CartesianInfo, ForceModeData, JointData, JointState, KinematicsInfo, RobotModeData,
    RobotStateType, Vector6d, JOINT_COUNT,
};

use crate::bin_parser::BinParser;
use crate::codec::{PackageType, RawFrame, HEADER_SIZE};
use crate::consumer::PackageConsumer;
use crate::error::ParseError;

/// A package body that can be decoded from an isolated body slice.
pub trait PackageBody: Sized {
    /// Decode from the cursor, consuming exactly the bytes of this body.
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError>;
}

/// Raw bytes of a frame or sub-package that has no decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UndecodedPackage {
    /// Top-level package type code.
    pub package_type: u8,
    /// State type or message type code, if the frame carries one.
    pub sub_type: Option<u8>,
    /// Body bytes following the (sub-)header.
    pub body: Bytes,
}

/// One decoded package.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Package {
    RobotModeData(RobotModeData),
    JointData(JointData),
    CartesianInfo(CartesianInfo),
    KinematicsInfo(KinematicsInfo),
    ForceModeData(ForceModeData),
    TextMessage(TextMessage),
    ProgramLabelMessage(ProgramLabelMessage),
    VersionMessage(VersionMessage),
    SafetyModeMessage(SafetyModeMessage),
    ErrorCodeMessage(ErrorCodeMessage),
    KeyMessage(KeyMessage),
    RuntimeExceptionMessage(RuntimeExceptionMessage),
    GlobalVariablesSetupMessage(GlobalVariablesSetupMessage),
    GlobalVariablesUpdateMessage(GlobalVariablesUpdateMessage),
    Undecoded(UndecodedPackage),
}

impl Package {
    /// Hand this package to the one matching consumer slot.
    ///
    /// Returns whether the consumer claimed it. `false` only means nobody
    /// was interested.
    pub fn consume_with<C: PackageConsumer + ?Sized>(&self, consumer: &mut C) -> bool {
        match self {
            Self::RobotModeData(p) => consumer.consume_robot_mode_data(p),
            Self::JointData(p) => consumer.consume_joint_data(p),
            Self::CartesianInfo(p) => consumer.consume_cartesian_info(p),
            Self::KinematicsInfo(p) => consumer.consume_kinematics_info(p),
            Self::ForceModeData(p) => consumer.consume_force_mode_data(p),
            Self::TextMessage(p) => consumer.consume_text_message(p),
            Self::ProgramLabelMessage(p) => consumer.consume_program_label_message(p),
            Self::VersionMessage(p) => consumer.consume_version_message(p),
            Self::SafetyModeMessage(p) => consumer.consume_safety_mode_message(p),
            Self::ErrorCodeMessage(p) => consumer.consume_error_code_message(p),
            Self::KeyMessage(p) => consumer.consume_key_message(p),
            Self::RuntimeExceptionMessage(p) => consumer.consume_runtime_exception_message(p),
            Self::GlobalVariablesSetupMessage(p) => {
                consumer.consume_global_variables_setup_message(p)
            }
            Self::GlobalVariablesUpdateMessage(p) => {
                consumer.consume_global_variables_update_message(p)
            }
            Self::Undecoded(p) => consumer.consume_undecoded(p),
        }
    }

    /// Short variant name for logs and tables.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RobotModeData(_) => "robot_mode_data",
            Self::JointData(_) => "joint_data",
            Self::CartesianInfo(_) => "cartesian_info",
            Self::KinematicsInfo(_) => "kinematics_info",
            Self::ForceModeData(_) => "force_mode_data",
            Self::TextMessage(_) => "text_message",
            Self::ProgramLabelMessage(_) => "program_label_message",
            Self::VersionMessage(_) => "version_message",
            Self::SafetyModeMessage(_) => "safety_mode_message",
            Self::ErrorCodeMessage(_) => "error_code_message",
            Self::KeyMessage(_) => "key_message",
            Self::RuntimeExceptionMessage(_) => "runtime_exception_message",
            Self::GlobalVariablesSetupMessage(_) => "global_variables_setup_message",
            Self::GlobalVariablesUpdateMessage(_) => "global_variables_update_message",
            Self::Undecoded(_) => "undecoded",
        }
    }

    /// Whether this is a discrete message rather than state telemetry.
    pub fn is_message(&self) -> bool {
        !matches!(
            self,
            Self::RobotModeData(_)
                | Self::JointData(_)
                | Self::CartesianInfo(_)
                | Self::KinematicsInfo(_)
                | Self::ForceModeData(_)
        )
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RobotModeData(p) => write!(
                f,
                "robot mode {} (control {}), speed scaling {:.3}, program running: {}",
                p.robot_mode, p.control_mode, p.speed_scaling, p.is_program_running
            ),
            Self::JointData(p) => {
                let q: Vec<String> = p.joints.iter().map(|j| format!("{:.4}", j.q_actual)).collect();
                write!(f, "joints q=[{}]", q.join(", "))
            }
            Self::CartesianInfo(p) => write!(f, "flange {:?}", p.flange_coordinates),
            Self::KinematicsInfo(p) => write!(f, "kinematics checksum {:?}", p.checksum),
            Self::ForceModeData(p) => write!(
                f,
                "wrench {:?}, dexterity {:.3}",
                p.wrench, p.robot_dexterity
            ),
            Self::TextMessage(p) => write!(f, "text: {}", p.text),
            Self::ProgramLabelMessage(p) => write!(f, "label {}: {}", p.id, p.label),
            Self::VersionMessage(p) => {
                write!(f, "{} {} ({})", p.project_name, p.version_string(), p.build_date)
            }
            Self::SafetyModeMessage(p) => write!(
                f,
                "safety mode {} (code {}, argument {})",
                p.safety_mode_type, p.message_code, p.message_argument
            ),
            Self::ErrorCodeMessage(p) => write!(
                f,
                "error C{}A{} level {}: {}",
                p.message_code, p.message_argument, p.report_level, p.text
            ),
            Self::KeyMessage(p) => write!(f, "key {}: {}", p.title, p.text),
            Self::RuntimeExceptionMessage(p) => write!(
                f,
                "runtime exception at {}:{}: {}",
                p.line_number, p.column_number, p.text
            ),
            Self::GlobalVariablesSetupMessage(p) => write!(
                f,
                "globals from {}: {}",
                p.start_index,
                p.variable_names.join(", ")
            ),
            Self::GlobalVariablesUpdateMessage(p) => write!(
                f,
                "global values from {} ({} bytes)",
                p.start_index,
                p.values.len()
            ),
            Self::Undecoded(p) => match p.sub_type {
                Some(sub) => write!(f, "undecoded {}/{} ({} bytes)", p.package_type, sub, p.body.len()),
                None => write!(f, "undecoded {} ({} bytes)", p.package_type, p.body.len()),
            },
        }
    }
}

fn parse_body<T: PackageBody>(
    body: &[u8],
    wrap: fn(T) -> Package,
) -> Result<Package, ParseError> {
    let mut bp = BinParser::new(body);
    let pkg = T::parse(&mut bp)?;
    if !bp.is_empty() {
        debug!(trailing = bp.remaining(), "package body has trailing bytes");
    }
    Ok(wrap(pkg))
}

fn undecoded(package_type: u8, sub_type: Option<u8>, body: &[u8]) -> Package {
    debug!(package_type, ?sub_type, len = body.len(), "no decoder for package");
    Package::Undecoded(UndecodedPackage {
        package_type,
        sub_type,
        body: Bytes::copy_from_slice(body),
    })
}

fn decode_state_sub_package(state_type: u8, body: &[u8]) -> Result<Package, ParseError> {
    match RobotStateType::from_code(state_type) {
        Some(RobotStateType::RobotModeData) => parse_body(body, Package::RobotModeData),
        Some(RobotStateType::JointData) => parse_body(body, Package::JointData),
        Some(RobotStateType::CartesianInfo) => parse_body(body, Package::CartesianInfo),
        Some(RobotStateType::KinematicsInfo) => parse_body(body, Package::KinematicsInfo),
        Some(RobotStateType::ForceModeData) => parse_body(body, Package::ForceModeData),
        _ => Ok(undecoded(
            PackageType::RobotState.code(),
            Some(state_type),
            body,
        )),
    }
}

fn decode_robot_message(message_type: u8, body: &[u8]) -> Result<Package, ParseError> {
    match RobotMessageType::from_code(message_type) {
        Some(RobotMessageType::Text) => parse_body(body, Package::TextMessage),
        Some(RobotMessageType::ProgramLabel) => parse_body(body, Package::ProgramLabelMessage),
        Some(RobotMessageType::Version) => parse_body(body, Package::VersionMessage),
        Some(RobotMessageType::SafetyMode) => parse_body(body, Package::SafetyModeMessage),
        Some(RobotMessageType::ErrorCode) => parse_body(body, Package::ErrorCodeMessage),
        Some(RobotMessageType::Key) => parse_body(body, Package::KeyMessage),
        Some(RobotMessageType::RuntimeException) => {
            parse_body(body, Package::RuntimeExceptionMessage)
        }
        _ => Ok(undecoded(
            PackageType::RobotMessage.code(),
            Some(message_type),
            body,
        )),
    }
}

fn decode_program_state(message_type: u8, body: &[u8]) -> Result<Package, ParseError> {
    match ProgramStateType::from_code(message_type) {
        Some(ProgramStateType::GlobalVariablesSetup) => {
            parse_body(body, Package::GlobalVariablesSetupMessage)
        }
        Some(ProgramStateType::GlobalVariablesUpdate) => {
            parse_body(body, Package::GlobalVariablesUpdateMessage)
        }
        None => Ok(undecoded(
            PackageType::ProgramState.code(),
            Some(message_type),
            body,
        )),
    }
}

/// Decode every package carried by one frame, appending them to `out` in
/// wire order.
///
/// A robot state frame yields one package per sub-package. If a decode
/// fails, packages decoded before the failure stay in `out` and the rest of
/// the frame is dropped.
pub fn decode_packages(frame: &RawFrame, out: &mut Vec<Package>) -> Result<(), ParseError> {
    match (PackageType::from_code(frame.package_type), frame.message_type) {
        (Some(PackageType::RobotState), _) => {
            let mut bp = BinParser::new(&frame.body);
            while !bp.is_empty() {
                let declared = bp.parse::<u32>()? as usize;
                let state_type = bp.parse::<u8>()?;
                let body_len = declared
                    .checked_sub(HEADER_SIZE)
                    .filter(|len| *len <= bp.remaining())
                    .ok_or(ParseError::InvalidSubPackageLength {
                        declared,
                        available: bp.remaining() + HEADER_SIZE,
                    })?;
                let body = bp.parse_bytes(body_len)?;
                out.push(decode_state_sub_package(state_type, body)?);
            }
            Ok(())
        }
        (Some(PackageType::RobotMessage), Some(message_type)) => {
            out.push(decode_robot_message(message_type, &frame.body)?);
            Ok(())
        }
        (Some(PackageType::ProgramState), Some(message_type)) => {
            out.push(decode_program_state(message_type, &frame.body)?);
            Ok(())
        }
        _ => {
            out.push(undecoded(
                frame.package_type,
                frame.message_type,
                &frame.body,
            ));
            Ok(())
        }
    }
}
