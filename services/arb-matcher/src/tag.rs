//! Reversible grid tag codec
//!
//! Orders carry an opaque tag string that survives the round trip through
//! external venues unchanged. The tag encodes which grid slot an order
//! belongs to so fills arriving later can be attributed without any
//! in-memory lookup. Format is versioned and pipe-delimited:
//!
//! `v1|<leg1>|<leg2>|<entry>|<exit>|<L/S>|<fraction>`
//!
//! Prices and the sizing fraction are fixed-point i64 ticks rendered as
//! decimal integers. Tickers containing the delimiter are rejected at
//! encode time.

use crate::SpreadDirection;
use thiserror::Error;

const TAG_VERSION: &str = "v1";
const DELIMITER: char = '|';
const FIELD_COUNT: usize = 7;

/// Tag codec errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    /// A ticker contains the field delimiter
    #[error("ticker '{ticker}' contains the tag delimiter")]
    DelimiterInTicker {
        /// Offending ticker
        ticker: String,
    },
    /// Tag does not carry the expected field count
    #[error("malformed tag: expected {FIELD_COUNT} fields, got {got}")]
    FieldCount {
        /// Observed field count
        got: usize,
    },
    /// Unknown version prefix
    #[error("unsupported tag version '{version}'")]
    Version {
        /// Observed version field
        version: String,
    },
    /// A numeric field failed to parse
    #[error("invalid numeric field '{field}'")]
    NumericField {
        /// Raw field text
        field: String,
    },
    /// The direction code is not recognized
    #[error("invalid direction code '{code}'")]
    DirectionCode {
        /// Raw code text
        code: String,
    },
}

/// Identity of one grid slot, embedded in order tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridTag {
    /// Leg 1 ticker
    pub leg1_ticker: String,
    /// Leg 2 ticker
    pub leg2_ticker: String,
    /// Grid entry spread, fixed-point
    pub entry_spread: i64,
    /// Grid exit spread, fixed-point
    pub exit_spread: i64,
    /// Spread direction of the slot
    pub direction: SpreadDirection,
    /// Sizing fraction of total capital, fixed-point (SCALE_4 = 100%)
    pub size_fraction: i64,
}

impl GridTag {
    /// Encode into the versioned wire string
    pub fn encode(&self) -> Result<String, TagError> {
        for ticker in [&self.leg1_ticker, &self.leg2_ticker] {
            if ticker.contains(DELIMITER) {
                return Err(TagError::DelimiterInTicker {
                    ticker: ticker.clone(),
                });
            }
        }
        Ok(format!(
            "{TAG_VERSION}|{}|{}|{}|{}|{}|{}",
            self.leg1_ticker,
            self.leg2_ticker,
            self.entry_spread,
            self.exit_spread,
            self.direction.code(),
            self.size_fraction,
        ))
    }

    /// Decode a wire string produced by [`encode`](Self::encode)
    pub fn decode(tag: &str) -> Result<Self, TagError> {
        let fields: Vec<&str> = tag.split(DELIMITER).collect();
        if fields.len() != FIELD_COUNT {
            return Err(TagError::FieldCount { got: fields.len() });
        }
        if fields[0] != TAG_VERSION {
            return Err(TagError::Version {
                version: fields[0].to_string(),
            });
        }
        let numeric = |field: &str| {
            field.parse::<i64>().map_err(|_| TagError::NumericField {
                field: field.to_string(),
            })
        };
        let direction =
            SpreadDirection::from_code(fields[5]).ok_or_else(|| TagError::DirectionCode {
                code: fields[5].to_string(),
            })?;

        Ok(Self {
            leg1_ticker: fields[1].to_string(),
            leg2_ticker: fields[2].to_string(),
            entry_spread: numeric(fields[3])?,
            exit_spread: numeric(fields[4])?,
            direction,
            size_fraction: numeric(fields[6])?,
        })
    }
}
