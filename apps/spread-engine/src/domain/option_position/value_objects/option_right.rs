//! Option Right Value Object

use serde::{Deserialize, Serialize};

use crate::domain::option_position::errors::CodecError;

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionRight {
    /// Put option (right to sell). Orders before `Call` so put wings sort first.
    Put,
    /// Call option (right to buy).
    Call,
}

impl OptionRight {
    /// Single-character code used inside option symbols.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Call => 'C',
            Self::Put => 'P',
        }
    }

    /// Decode the single-character symbol code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Self::Call),
            'P' => Some(Self::Put),
            _ => None,
        }
    }

    /// Parse a broker put/call field (`CALL`, `PUT`, `C`, `P`, any case).
    pub fn parse_field(value: &str) -> Result<Self, CodecError> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CALL" | "C" => Ok(Self::Call),
            "PUT" | "P" => Ok(Self::Put),
            _ => Err(CodecError::InvalidRight {
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}
