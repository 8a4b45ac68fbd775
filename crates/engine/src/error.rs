//! Error types for the COT engine
//!
//! Data-quality problems (negative contract counts, unknown currency codes)
//! always surface to the caller. Statistical edge cases with a documented
//! fallback (flat rolling window, zero-variance z-score) never appear here:
//! they resolve to an undefined index value or a zero z-score at the call
//! site.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CotError {
    #[error("Insufficient history: have {have} observations, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Invalid position data: negative contract count (long={long}, short={short})")]
    InvalidPositionData { long: i64, short: i64 },

    #[error("Invalid lookback window: {0}")]
    InvalidLookback(usize),

    #[error("Cannot invert non-positive price in bar dated {0}")]
    NonPositivePrice(NaiveDate),
}

pub type CotResult<T> = Result<T, CotError>;
