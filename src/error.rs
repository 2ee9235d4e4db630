// =============================================================================
// Engine Errors — programming-contract violations only
// =============================================================================
//
// Data-quality conditions (short history, flat ranges, degenerate fits) are
// expressed as `None` at the call site. Only malformed input shapes surface
// here: zero periods, mismatched array lengths, unordered dates.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("invalid {name} period: {value} (must be >= 1)")]
    InvalidPeriod { name: &'static str, value: usize },

    #[error("length mismatch: {left_name}={left} vs {right_name}={right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },

    #[error("series must contain at least one point")]
    EmptySeries,

    #[error("non-finite close at index {index}")]
    NonFiniteClose { index: usize },

    #[error("dates must be strictly ascending (violated at index {index})")]
    UnorderedDates { index: usize },

    #[error("invalid {name} parameter: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("unknown timeframe token: {0:?}")]
    UnknownTimeframe(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject a zero look-back period.
pub(crate) fn ensure_period(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(EngineError::InvalidPeriod { name, value });
    }
    Ok(())
}

/// Reject two parallel arrays of different lengths.
pub(crate) fn ensure_same_len(
    left_name: &'static str,
    left: usize,
    right_name: &'static str,
    right: usize,
) -> Result<()> {
    if left != right {
        return Err(EngineError::LengthMismatch {
            left_name,
            left,
            right_name,
            right,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_period_is_rejected() {
        let err = ensure_period("sma", 0).unwrap_err();
        assert_eq!(err, EngineError::InvalidPeriod { name: "sma", value: 0 });
        assert!(ensure_period("sma", 1).is_ok());
    }

    #[test]
    fn length_mismatch_message() {
        let err = ensure_same_len("highs", 3, "closes", 4).unwrap_err();
        assert_eq!(err.to_string(), "length mismatch: highs=3 vs closes=4");
    }
}
