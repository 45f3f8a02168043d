//! unitext core - quantities, units and conversion
//!
//! Provides the static unit vocabulary shared by the text scanner:
//! - `QuantityType`: the five measurement domains (temperature, distance,
//!   length, weight, volume)
//! - `Unit` and `UNITS`: the unit enum and the lowercase-name registry
//! - `convert`: base-unit pivot conversion
//! - `format`: fixed-point display formatting with comma decimals
//! - `Preferences`: the read-only user settings snapshot

mod quantity;
mod unit;
mod units;
mod error;
mod settings;
pub mod convert;
pub mod format;

pub use quantity::QuantityType;
pub use unit::{Unit, UnitDefinition};
pub use units::{UnitRegistry, UNITS};
pub use error::{ConversionError, SettingsError};
pub use settings::{Preferences, MAX_DECIMAL_PLACES};
pub use convert::{convert, convert_unit, ConversionResult};
pub use format::{format_value, FormatOptions};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ConversionError, ConversionResult, FormatOptions, Preferences, QuantityType, Unit, UNITS,
    };
}
