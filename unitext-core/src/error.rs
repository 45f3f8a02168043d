//! Error types
//!
//! None of these ever reach the annotated output: the text pipeline drops a
//! candidate it cannot convert and leaves the surrounding text alone.

use thiserror::Error;
use crate::Unit;

/// Errors raised by the conversion layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} ({from_quantity}) to {to} ({to_quantity}): incompatible units")]
    IncompatibleUnits {
        from: Unit,
        to: Unit,
        from_quantity: &'static str,
        to_quantity: &'static str,
    },

    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("unknown quantity letter: {0}")]
    UnknownQuantity(char),

    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

impl ConversionError {
    pub fn incompatible(from: Unit, to: Unit) -> Self {
        ConversionError::IncompatibleUnits {
            from,
            to,
            from_quantity: from.quantity().name(),
            to_quantity: to.quantity().name(),
        }
    }
}

/// Errors raised while loading or validating preferences
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("{field} must be a {expected} unit, got {unit}")]
    WrongQuantity {
        field: &'static str,
        expected: &'static str,
        unit: Unit,
    },
}
