//! Option Position Errors

use thiserror::Error;

/// Errors from the option symbol codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text does not match any accepted symbol layout.
    #[error("Unparseable option symbol '{raw}'")]
    UnparseableSymbol {
        /// The raw input as received.
        raw: String,
    },

    /// The expiry digits do not form a calendar date in 2000-2099.
    #[error("Invalid expiry '{value}'")]
    InvalidExpiry {
        /// Offending expiry text.
        value: String,
    },

    /// The root is empty, too long, or contains unsupported characters.
    #[error("Invalid option root '{root}'")]
    InvalidRoot {
        /// Offending root.
        root: String,
    },

    /// The strike cannot be written as eight digits of thousandths.
    #[error("Strike {mills} (thousandths) is outside the representable range")]
    StrikeOutOfRange {
        /// Strike in thousandths.
        mills: i64,
    },

    /// The put/call field is neither CALL nor PUT.
    #[error("Invalid option right '{value}'")]
    InvalidRight {
        /// Offending right text.
        value: String,
    },
}

/// Errors that can occur while building a spread structure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionPositionError {
    /// A leg symbol could not be built.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Strikes, widths, or quantities do not describe a valid structure.
    #[error("Invalid structure: {message}")]
    InvalidStructure {
        /// Description of the violated constraint.
        message: String,
    },
}

impl OptionPositionError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CodecError::UnparseableSymbol {
            raw: "garbage".to_string(),
        };
        assert_eq!(err.to_string(), "Unparseable option symbol 'garbage'");

        let err = OptionPositionError::invalid("put wing must sit below call wing");
        assert_eq!(
            err.to_string(),
            "Invalid structure: put wing must sit below call wing"
        );

        let err: OptionPositionError = CodecError::StrikeOutOfRange { mills: -5 }.into();
        assert_eq!(
            err.to_string(),
            "Strike -5 (thousandths) is outside the representable range"
        );
    }
}
