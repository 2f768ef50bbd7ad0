//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during schema construction and validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be at least {min} characters, got {actual}")]
    TooShort {
        field: String,
        min: usize,
        actual: usize,
    },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' must contain between {min} and {max} items, got {actual}")]
    CountOutOfRange {
        field: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' must contain at least {min} items, got {actual}")]
    TooFewItems {
        field: String,
        min: usize,
        actual: usize,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates a too-short validation error.
    pub fn too_short(field: impl Into<String>, min: usize, actual: usize) -> Self {
        ValidationError::TooShort {
            field: field.into(),
            min,
            actual,
        }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates a list length validation error.
    pub fn count_out_of_range(
        field: impl Into<String>,
        min: usize,
        max: usize,
        actual: usize,
    ) -> Self {
        ValidationError::CountOutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates a lower-bound-only list length validation error.
    pub fn too_few_items(field: impl Into<String>, min: usize, actual: usize) -> Self {
        ValidationError::TooFewItems {
            field: field.into(),
            min,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the field name with a parent path (e.g. `factors[2].name`).
    pub fn within(self, parent: impl AsRef<str>) -> Self {
        let prefix = |field: String| format!("{}.{}", parent.as_ref(), field);
        match self {
            ValidationError::EmptyField { field } => ValidationError::EmptyField {
                field: prefix(field),
            },
            ValidationError::TooShort { field, min, actual } => ValidationError::TooShort {
                field: prefix(field),
                min,
                actual,
            },
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => ValidationError::OutOfRange {
                field: prefix(field),
                min,
                max,
                actual,
            },
            ValidationError::CountOutOfRange {
                field,
                min,
                max,
                actual,
            } => ValidationError::CountOutOfRange {
                field: prefix(field),
                min,
                max,
                actual,
            },
            ValidationError::TooFewItems { field, min, actual } => ValidationError::TooFewItems {
                field: prefix(field),
                min,
                actual,
            },
            ValidationError::InvalidFormat { field, reason } => ValidationError::InvalidFormat {
                field: prefix(field),
                reason,
            },
        }
    }
}

/// Fails with `OutOfRange` unless `min <= value <= max`. NaN is rejected.
pub(crate) fn require_in_range(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if !(min..=max).contains(&value) {
        return Err(ValidationError::out_of_range(field, min, max, value));
    }
    Ok(())
}

/// Fails with `CountOutOfRange` unless `min <= len <= max`.
pub(crate) fn require_count(
    field: &str,
    len: usize,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if len < min || len > max {
        return Err(ValidationError::count_out_of_range(field, min, max, len));
    }
    Ok(())
}

/// Fails with `TooFewItems` when `len < min`.
pub(crate) fn require_min_items(field: &str, len: usize, min: usize) -> Result<(), ValidationError> {
    if len < min {
        return Err(ValidationError::too_few_items(field, min, len));
    }
    Ok(())
}
