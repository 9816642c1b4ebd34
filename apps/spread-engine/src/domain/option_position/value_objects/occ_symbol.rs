//! Option Symbol Codec
//!
//! Bidirectional mapping between exchange-format option symbols and
//! [`CanonicalLegKey`]s.
//!
//! # Accepted input
//!
//! Parsing tolerates the loose spellings brokers and signal feeds produce:
//!
//! | Input | Meaning |
//! |-------|---------|
//! | `SPXW  251219P05800000` | fixed-width, eight-digit strike |
//! | `.SPXW251219P5800` | leading dot, integer strike |
//! | `spxw 251219 p 5800.5` | lowercase, whitespace, fractional strike |
//! | `SPXW_251219P5800` | underscore separators |
//!
//! # Output
//!
//! Building always produces the fixed layout: root left-aligned and padded
//! to six characters, `YYMMDD`, `C`/`P`, and the strike as eight digits of
//! thousandths. Brokers reject anything else.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CanonicalLegKey, OptionRight, Strike};
use crate::domain::option_position::errors::CodecError;

/// Maximum root length in the fixed layout.
const ROOT_WIDTH: usize = 6;

/// A parsed option symbol: root plus canonical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionSymbol {
    root: String,
    key: CanonicalLegKey,
}

impl OptionSymbol {
    /// Build a symbol from its parts, validating that it is representable.
    pub fn build(
        root: &str,
        expiration: NaiveDate,
        right: OptionRight,
        strike: Strike,
    ) -> Result<Self, CodecError> {
        Self::from_key(root, CanonicalLegKey::new(expiration, right, strike))
    }

    /// Attach a root to an existing key.
    pub fn from_key(root: &str, key: CanonicalLegKey) -> Result<Self, CodecError> {
        let root = root.trim().to_ascii_uppercase();
        if root.is_empty() || root.len() > ROOT_WIDTH || !root.chars().all(is_root_char) {
            return Err(CodecError::InvalidRoot { root });
        }
        if !(2000..=2099).contains(&key.expiration.year()) {
            return Err(CodecError::InvalidExpiry {
                value: key.expiration.to_string(),
            });
        }
        if !key.strike.is_representable() {
            return Err(CodecError::StrikeOutOfRange {
                mills: key.strike.mills(),
            });
        }
        Ok(Self { root, key })
    }

    /// Parse any accepted spelling into a canonical symbol.
    pub fn parse(raw: &str) -> Result<Self, CodecError> {
        let cleaned = normalize(raw);
        let parts = split_loose(&cleaned)
            .or_else(|| split_fixed(&cleaned))
            .ok_or_else(|| CodecError::UnparseableSymbol {
                raw: raw.to_string(),
            })?;

        let expiration = parse_expiry(&parts.expiry)?;
        let right = OptionRight::from_code(parts.right).ok_or_else(|| {
            CodecError::UnparseableSymbol {
                raw: raw.to_string(),
            }
        })?;

        Self::build(&parts.root, expiration, right, Strike::from_mills(parts.mills))
    }

    /// Reconstruct a symbol from structured instrument fields.
    ///
    /// `expiration` may be an ISO date or an ISO timestamp; only the date
    /// prefix is read.
    pub fn from_instrument_fields(
        root: &str,
        expiration: &str,
        put_call: &str,
        strike: Decimal,
    ) -> Result<Self, CodecError> {
        let date_part = expiration.get(..10).unwrap_or(expiration);
        let expiration = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
            CodecError::InvalidExpiry {
                value: expiration.to_string(),
            }
        })?;
        let right = OptionRight::parse_field(put_call)?;
        let strike = Strike::from_decimal(strike).ok_or(CodecError::StrikeOutOfRange {
            mills: i64::MAX,
        })?;
        Self::build(root, expiration, right, strike)
    }

    /// Underlying root (without padding).
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Canonical key.
    #[must_use]
    pub const fn key(&self) -> &CanonicalLegKey {
        &self.key
    }

    /// Expiration date.
    #[must_use]
    pub const fn expiration(&self) -> NaiveDate {
        self.key.expiration
    }

    /// Call or put.
    #[must_use]
    pub const fn right(&self) -> OptionRight {
        self.key.right
    }

    /// Strike.
    #[must_use]
    pub const fn strike(&self) -> Strike {
        self.key.strike
    }
}

impl fmt::Display for OptionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<width$}{}{}{:08}",
            self.root,
            self.key.expiry_code(),
            self.key.right.code(),
            self.key.strike.mills(),
            width = ROOT_WIDTH
        )
    }
}

struct SymbolParts {
    root: String,
    expiry: String,
    right: char,
    mills: i64,
}

const fn is_root_char(c: char) -> bool {
    c.is_ascii_uppercase() || matches!(c, '.' | '$' | '^')
}

fn normalize(raw: &str) -> String {
    let compact: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    compact
        .trim_start_matches('.')
        .chars()
        .filter(|c| is_root_char(*c) || c.is_ascii_digit())
        .collect()
}

#[allow(clippy::expect_used)] // Patterns are compile-time constants
fn loose_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Z.$^]{1,6})(\d{6})([CP])(\d{1,5})(?:\.(\d{1,3}))?$")
            .expect("loose symbol regex is valid")
    })
}

#[allow(clippy::expect_used)] // Patterns are compile-time constants
fn fixed_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Z.$^]{1,6})(\d{6})([CP])(\d{8})$").expect("fixed symbol regex is valid")
    })
}

fn split_loose(cleaned: &str) -> Option<SymbolParts> {
    let caps = loose_pattern().captures(cleaned)?;
    let whole: i64 = caps.get(4)?.as_str().parse().ok()?;
    let fraction: i64 = match caps.get(5) {
        Some(m) => format!("{:0<3}", m.as_str()).parse().ok()?,
        None => 0,
    };
    Some(SymbolParts {
        root: caps.get(1)?.as_str().to_string(),
        expiry: caps.get(2)?.as_str().to_string(),
        right: caps.get(3)?.as_str().chars().next()?,
        mills: whole * Strike::MILLS_PER_POINT + fraction,
    })
}

fn split_fixed(cleaned: &str) -> Option<SymbolParts> {
    let caps = fixed_pattern().captures(cleaned)?;
    Some(SymbolParts {
        root: caps.get(1)?.as_str().to_string(),
        expiry: caps.get(2)?.as_str().to_string(),
        right: caps.get(3)?.as_str().chars().next()?,
        mills: caps.get(4)?.as_str().parse().ok()?,
    })
}

fn parse_expiry(yymmdd: &str) -> Result<NaiveDate, CodecError> {
    let invalid = || CodecError::InvalidExpiry {
        value: yymmdd.to_string(),
    };
    let field = |range: std::ops::Range<usize>| -> Result<u32, CodecError> {
        yymmdd
            .get(range)
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)
    };
    let year = 2000 + field(0..2)? as i32;
    NaiveDate::from_ymd_opt(year, field(2..4)?, field(4..6)?).ok_or_else(invalid)
}
