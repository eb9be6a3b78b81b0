//! Robot message packages (discrete events).

use crate::bin_parser::BinParser;
use crate::error::ParseError;
use crate::package::PackageBody;

/// Message type codes inside a robot message frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RobotMessageType {
    Text = 0,
    ProgramLabel = 1,
    PopupMessage = 2,
    Version = 3,
    SafetyMode = 5,
    ErrorCode = 6,
    Key = 7,
    RequestValue = 9,
    RuntimeException = 10,
}

impl RobotMessageType {
    /// Map a wire code to a known message type.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Text,
            1 => Self::ProgramLabel,
            2 => Self::PopupMessage,
            3 => Self::Version,
            5 => Self::SafetyMode,
            6 => Self::ErrorCode,
            7 => Self::Key,
            9 => Self::RequestValue,
            10 => Self::RuntimeException,
            _ => return None,
        })
    }
}

/// Free-form text from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextMessage {
    pub text: String,
}

impl PackageBody for TextMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            text: bp.parse_remainder_string(),
        })
    }
}

/// Label reached by the running program.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProgramLabelMessage {
    pub id: i32,
    pub label: String,
}

impl PackageBody for ProgramLabelMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            id: bp.parse()?,
            label: bp.parse_remainder_string(),
        })
    }
}

/// Controller software version banner, sent once after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct VersionMessage {
    pub project_name: String,
    pub major_version: u8,
    pub minor_version: u8,
    pub bugfix_version: i32,
    pub build_number: i32,
    pub build_date: String,
}

impl VersionMessage {
    /// `major.minor.bugfix.build`.
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.major_version, self.minor_version, self.bugfix_version, self.build_number
        )
    }
}

impl PackageBody for VersionMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            project_name: bp.parse_prefixed_string()?,
            major_version: bp.parse()?,
            minor_version: bp.parse()?,
            bugfix_version: bp.parse()?,
            build_number: bp.parse()?,
            build_date: bp.parse_remainder_string(),
        })
    }
}

/// Safety mode change report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SafetyModeMessage {
    pub message_code: i32,
    pub message_argument: i32,
    pub safety_mode_type: u8,
    pub report_data_type: u32,
    pub report_data: u32,
}

impl PackageBody for SafetyModeMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            message_code: bp.parse()?,
            message_argument: bp.parse()?,
            safety_mode_type: bp.parse()?,
            report_data_type: bp.parse()?,
            report_data: bp.parse()?,
        })
    }
}

/// Numbered error or notification from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ErrorCodeMessage {
    pub message_code: i32,
    pub message_argument: i32,
    pub report_level: i32,
    pub data_type: u8,
    pub data: u32,
    pub text: String,
}

impl PackageBody for ErrorCodeMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            message_code: bp.parse()?,
            message_argument: bp.parse()?,
            report_level: bp.parse()?,
            data_type: bp.parse()?,
            data: bp.parse()?,
            text: bp.parse_remainder_string(),
        })
    }
}

/// Numbered key event with a title and text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct KeyMessage {
    pub message_code: i32,
    pub message_argument: i32,
    pub title: String,
    pub text: String,
}

impl PackageBody for KeyMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            message_code: bp.parse()?,
            message_argument: bp.parse()?,
            title: bp.parse_prefixed_string()?,
            text: bp.parse_remainder_string(),
        })
    }
}

/// Runtime error raised by the running script.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RuntimeExceptionMessage {
    pub line_number: i32,
    pub column_number: i32,
    pub text: String,
}

impl PackageBody for RuntimeExceptionMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            line_number: bp.parse()?,
            column_number: bp.parse()?,
            text: bp.parse_remainder_string(),
        })
    }
}
