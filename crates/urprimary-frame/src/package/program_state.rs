//! Program state packages (global variable announcements and updates).

use bytes::Bytes;

use crate::bin_parser::BinParser;
use crate::error::ParseError;
use crate::package::PackageBody;

/// Message type codes inside a program state frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProgramStateType {
    GlobalVariablesSetup = 0,
    GlobalVariablesUpdate = 1,
}

impl ProgramStateType {
    /// Map a wire code to a known program state type.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::GlobalVariablesSetup),
            1 => Some(Self::GlobalVariablesUpdate),
            _ => None,
        }
    }
}

/// Names of the program's global variables, starting at `start_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GlobalVariablesSetupMessage {
    pub start_index: u16,
    pub variable_names: Vec<String>,
}

impl PackageBody for GlobalVariablesSetupMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        let start_index = bp.parse()?;
        let variable_names = bp
            .parse_remainder_string()
            .split('\n')
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(Self {
            start_index,
            variable_names,
        })
    }
}

/// Encoded values of global variables, starting at `start_index`.
///
/// The value encoding is type-tagged per variable and left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GlobalVariablesUpdateMessage {
    pub start_index: u16,
    pub values: Bytes,
}

impl PackageBody for GlobalVariablesUpdateMessage {
    fn parse(bp: &mut BinParser<'_>) -> Result<Self, ParseError> {
        Ok(Self {
            start_index: bp.parse()?,
            values: bp.parse_remainder(),
        })
    }
}
