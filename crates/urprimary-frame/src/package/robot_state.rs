//! Robot state sub-packages (continuously streamed telemetry).

use crate::bin_parser::BinParser;
use crate::error::ParseError;
use crate::package::PackageBody;

/// Sub-package type codes inside a robot state frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RobotStateType {
    RobotModeData = 0,
    JointData = 1,
    ToolData = 2,
    MasterboardData = 3,
    CartesianInfo = 4,
    KinematicsInfo = 5,
    ConfigurationData = 6,
    ForceModeData = 7,
    AdditionalInfo = 8,
    CalibrationData = 9,
}

impl RobotStateType {
    /// Map a wire code to a known state type.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::RobotModeData,
            1 => Self::JointData,
            2 => Self::ToolData,
            3 => Self::MasterboardData,
            4 => Self::CartesianInfo,
            5 => Self::KinematicsInfo,
            6 => Self::ConfigurationData,
            7 => Self::ForceModeData,
            8 => Self::AdditionalInfo,
            9 => Self::CalibrationData,
            _ => return None,
        })
    }
}

/// Number of joints reported by the controller.
pub const JOINT_COUNT: usize = 6;

/// Six doubles: a pose, a wrench, or one DH parameter per joint.
pub type Vector6d = [f64; JOINT_COUNT];

/// Robot mode flags and speed settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RobotModeData {
    pub timestamp: u64,
    pub is_real_robot_connected: bool,
    pub is_real_robot_enabled: bool,
    pub is_robot_power_on: bool,
    pub is_emergency_stopped: bool,
    pub is_protective_stopped: bool,
    pub is_program_running: bool,
    pub is_program_paused: bool,
    pub robot_mode: i8,
    pub control_mode: u8,
    pub target_speed_fraction: f64,
    pub speed_scaling: f64,
    /// Absent on older firmware.
    pub target_speed_fraction_limit: Option<f64>,
}

impl PackageBody for RobotModeData {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            timestamp: bp.parse()?,
            is_real_robot_connected: bp.parse()?,
            is_real_robot_enabled: bp.parse()?,
            is_robot_power_on: bp.parse()?,
            is_emergency_stopped: bp.parse()?,
            is_protective_stopped: bp.parse()?,
            is_program_running: bp.parse()?,
            is_program_paused: bp.parse()?,
            robot_mode: bp.parse()?,
            control_mode: bp.parse()?,
            target_speed_fraction: bp.parse()?,
            speed_scaling: bp.parse()?,
            target_speed_fraction_limit: bp.parse_optional()?,
        })
    }
}

/// State of one joint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct JointState {
    pub q_actual: f64,
    pub q_target: f64,
    pub qd_actual: f64,
    pub i_actual: f32,
    pub v_actual: f32,
    pub t_motor: f32,
    pub t_micro: f32,
    pub joint_mode: u8,
}

impl PackageBody for JointState {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            q_actual: bp.parse()?,
            q_target: bp.parse()?,
            qd_actual: bp.parse()?,
            i_actual: bp.parse()?,
            v_actual: bp.parse()?,
            t_motor: bp.parse()?,
            t_micro: bp.parse()?,
            joint_mode: bp.parse()?,
        })
    }
}

/// Per-joint positions, velocities and motor readings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct JointData {
    pub joints: [JointState; JOINT_COUNT],
}

impl PackageBody for JointData {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        let mut joints = [JointState::default(); JOINT_COUNT];
        for joint in &mut joints {
            *joint = JointState::parse(bp)?;
        }
        Ok(Self { joints })
    }
}

/// Flange pose and configured TCP offset.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CartesianInfo {
    pub flange_coordinates: Vector6d,
    pub tcp_offset_coordinates: Vector6d,
}

impl PackageBody for CartesianInfo {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            flange_coordinates: bp.parse_array()?,
            tcp_offset_coordinates: bp.parse_array()?,
        })
    }
}

/// Denavit-Hartenberg parameters the controller uses for this robot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KinematicsInfo {
    pub checksum: [u32; JOINT_COUNT],
    pub dh_theta: Vector6d,
    pub dh_a: Vector6d,
    pub dh_d: Vector6d,
    pub dh_alpha: Vector6d,
    /// Absent on older firmware.
    pub calibration_status: Option<u32>,
}

impl PackageBody for KinematicsInfo {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            checksum: bp.parse_array()?,
            dh_theta: bp.parse_array()?,
            dh_a: bp.parse_array()?,
            dh_d: bp.parse_array()?,
            dh_alpha: bp.parse_array()?,
            calibration_status: bp.parse_optional()?,
        })
    }
}

/// Force mode wrench and dexterity.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ForceModeData {
    pub wrench: Vector6d,
    pub robot_dexterity: f64,
}

impl PackageBody for ForceModeData {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            wrench: bp.parse_array()?,
            robot_dexterity: bp.parse()?,
        })
    }
}
