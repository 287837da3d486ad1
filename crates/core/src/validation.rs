//! Input validation primitives shared by all mutations.
//!
//! Every check here runs before any write; the first failing check aborts
//! the whole operation. Errors carry the offending field name so callers
//! can correct and resubmit.

use cashbook_shared::AppError;
use thiserror::Error;

/// Validation errors for malformed inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Amount must be a positive integer.
    #[error("{field} must be greater than 0")]
    NotPositive {
        /// Offending field name.
        field: &'static str,
    },

    /// Delta must be a non-zero integer.
    #[error("{field} must not be zero")]
    ZeroDelta {
        /// Offending field name.
        field: &'static str,
    },

    /// Timestamp must be positive milliseconds since epoch.
    #[error("{field} must be a valid timestamp")]
    InvalidTimestamp {
        /// Offending field name.
        field: &'static str,
    },

    /// Required name/note is empty after trimming.
    #[error("{field} cannot be empty")]
    Empty {
        /// Offending field name.
        field: &'static str,
    },

    /// Listing limit is out of bounds.
    #[error("limit must be an integer between 1 and {max}")]
    InvalidLimit {
        /// Upper bound for the limit.
        max: u64,
    },

    /// Time range is inverted.
    #[error("from must be less than or equal to to")]
    InvertedRange,

    /// `note` and `clear_note` supplied in the same patch.
    #[error("note and clear_note cannot be used together")]
    NoteConflict,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Asserts that a transaction amount is a positive integer.
///
/// # Errors
///
/// Returns `ValidationError::NotPositive` if `value <= 0`.
pub const fn positive_amount(value: i64, field: &'static str) -> Result<i64, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(value)
}

/// Asserts that an adjustment delta is non-zero (positive or negative).
///
/// # Errors
///
/// Returns `ValidationError::ZeroDelta` if `value == 0`.
pub const fn non_zero_delta(value: i64, field: &'static str) -> Result<i64, ValidationError> {
    if value == 0 {
        return Err(ValidationError::ZeroDelta { field });
    }
    Ok(value)
}

/// Asserts that a value is a plausible millisecond timestamp.
///
/// # Errors
///
/// Returns `ValidationError::InvalidTimestamp` if `value <= 0`.
pub const fn timestamp_millis(value: i64, field: &'static str) -> Result<i64, ValidationError> {
    if value <= 0 {
        return Err(ValidationError::InvalidTimestamp { field });
    }
    Ok(value)
}

/// Trims a required name, rejecting the empty result.
///
/// # Errors
///
/// Returns `ValidationError::Empty` if the trimmed value is empty.
pub fn required_name(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

/// Normalizes an optional note: trims, and maps empty/absent to `None`.
#[must_use]
pub fn optional_note(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Resolves a listing limit against a default and an inclusive maximum.
///
/// # Errors
///
/// Returns `ValidationError::InvalidLimit` when the requested limit is zero
/// or exceeds `max`.
pub const fn bounded_limit(
    requested: Option<u64>,
    default: u64,
    max: u64,
) -> Result<u64, ValidationError> {
    let limit = match requested {
        Some(limit) => limit,
        None => default,
    };
    if limit == 0 || limit > max {
        return Err(ValidationError::InvalidLimit { max });
    }
    Ok(limit)
}

/// Validates an optional inclusive `occurred_at` range and fills defaults.
///
/// # Errors
///
/// Returns an error if either bound is not a valid timestamp or the range
/// is inverted.
pub fn time_range(from: Option<i64>, to: Option<i64>) -> Result<(i64, i64), ValidationError> {
    if let Some(from) = from {
        timestamp_millis(from, "from")?;
    }
    if let Some(to) = to {
        timestamp_millis(to, "to")?;
    }
    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(ValidationError::InvertedRange);
    }
    Ok((from.unwrap_or(0), to.unwrap_or(i64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(100)]
    #[case(i64::MAX)]
    fn test_positive_amount_accepts(#[case] value: i64) {
        assert_eq!(positive_amount(value, "amount"), Ok(value));
    }

    #[rstest]
    #[case(0)]
    #[case(-1)]
    #[case(i64::MIN)]
    fn test_positive_amount_rejects(#[case] value: i64) {
        assert_eq!(
            positive_amount(value, "amount"),
            Err(ValidationError::NotPositive { field: "amount" })
        );
    }

    #[test]
    fn test_non_zero_delta() {
        assert_eq!(non_zero_delta(-500, "delta"), Ok(-500));
        assert_eq!(non_zero_delta(500, "delta"), Ok(500));
        assert_eq!(
            non_zero_delta(0, "delta"),
            Err(ValidationError::ZeroDelta { field: "delta" })
        );
    }

    #[test]
    fn test_timestamp_millis() {
        assert!(timestamp_millis(1_700_000_000_000, "occurred_at").is_ok());
        assert!(timestamp_millis(0, "occurred_at").is_err());
        assert!(timestamp_millis(-5, "occurred_at").is_err());
    }

    #[test]
    fn test_required_name_trims() {
        assert_eq!(required_name("  Groceries ", "name"), Ok("Groceries".to_string()));
        assert_eq!(
            required_name("   ", "name"),
            Err(ValidationError::Empty { field: "name" })
        );
    }

    #[test]
    fn test_optional_note() {
        assert_eq!(optional_note(None), None);
        assert_eq!(optional_note(Some("  ")), None);
        assert_eq!(optional_note(Some(" lunch ")), Some("lunch".to_string()));
    }

    #[test]
    fn test_bounded_limit_defaults_and_bounds() {
        assert_eq!(bounded_limit(None, 100, 500), Ok(100));
        assert_eq!(bounded_limit(Some(500), 100, 500), Ok(500));
        assert_eq!(
            bounded_limit(Some(501), 100, 500),
            Err(ValidationError::InvalidLimit { max: 500 })
        );
        assert_eq!(
            bounded_limit(Some(0), 100, 500),
            Err(ValidationError::InvalidLimit { max: 500 })
        );
    }

    #[test]
    fn test_time_range() {
        assert_eq!(time_range(None, None), Ok((0, i64::MAX)));
        assert_eq!(time_range(Some(10), Some(20)), Ok((10, 20)));
        assert_eq!(time_range(Some(10), Some(10)), Ok((10, 10)));
        assert_eq!(time_range(Some(20), Some(10)), Err(ValidationError::InvertedRange));
        assert!(time_range(Some(0), None).is_err());
    }

    #[test]
    fn test_error_messages_carry_field() {
        assert_eq!(
            ValidationError::NotPositive { field: "amount" }.to_string(),
            "amount must be greater than 0"
        );
        assert_eq!(
            ValidationError::Empty { field: "note" }.to_string(),
            "note cannot be empty"
        );
    }

    #[test]
    fn test_conversion_to_app_error() {
        let err: cashbook_shared::AppError =
            ValidationError::NoteConflict.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }
}
