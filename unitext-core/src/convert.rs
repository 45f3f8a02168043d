//! Conversion engine - every quantity pivots through one base unit
//!
//! | quantity    | base |
//! |-------------|------|
//! | temperature | C    |
//! | distance    | m    |
//! | length      | cm   |
//! | weight      | g    |
//! | volume      | ml   |

use serde::{Serialize, Deserialize};
use crate::{ConversionError, FormatOptions, QuantityType, Unit};
use crate::format::format_value;

const METERS_PER_KILOMETER: f64 = 1000.0;
const METERS_PER_MILE: f64 = 1609.344;
const METERS_PER_FOOT: f64 = 0.3048;

const MILLIMETERS_PER_CENTIMETER: f64 = 10.0;
const CENTIMETERS_PER_INCH: f64 = 2.54;
const CENTIMETERS_PER_YARD: f64 = 91.44;
const CENTIMETERS_PER_APPLE: f64 = 7.5;

const GRAMS_PER_KILOGRAM: f64 = 1000.0;
const GRAMS_PER_POUND: f64 = 453.592;
const GRAMS_PER_OUNCE: f64 = 28.3495;

const MILLILITERS_PER_LITER: f64 = 1000.0;
const MILLILITERS_PER_GALLON: f64 = 3785.41;
const MILLILITERS_PER_FLUID_OUNCE: f64 = 29.5735;

const KELVIN_OFFSET: f64 = 273.15;

/// Formatted pair produced by a conversion: the value in its source unit
/// and the value in the target unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionResult {
    pub original: String,
    pub converted: String,
}

/// Convert a value into its quantity's base unit
pub fn to_base(value: f64, from: Unit) -> f64 {
    match from {
        Unit::Celsius => value,
        Unit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        Unit::Kelvin => value - KELVIN_OFFSET,

        Unit::Meter => value,
        Unit::Kilometer => value * METERS_PER_KILOMETER,
        Unit::Mile => value * METERS_PER_MILE,
        Unit::Foot => value * METERS_PER_FOOT,

        Unit::Centimeter => value,
        Unit::Millimeter => value / MILLIMETERS_PER_CENTIMETER,
        Unit::Inch => value * CENTIMETERS_PER_INCH,
        Unit::Yard => value * CENTIMETERS_PER_YARD,
        Unit::Apple => value * CENTIMETERS_PER_APPLE,

        Unit::Gram => value,
        Unit::Kilogram => value * GRAMS_PER_KILOGRAM,
        Unit::Pound => value * GRAMS_PER_POUND,
        Unit::Ounce => value * GRAMS_PER_OUNCE,

        Unit::Milliliter => value,
        Unit::Liter => value * MILLILITERS_PER_LITER,
        Unit::Gallon => value * MILLILITERS_PER_GALLON,
        Unit::FluidOunce => value * MILLILITERS_PER_FLUID_OUNCE,
    }
}

/// Convert a base-unit value into the target unit
pub fn from_base(value: f64, to: Unit) -> f64 {
    match to {
        Unit::Celsius => value,
        Unit::Fahrenheit => value * 9.0 / 5.0 + 32.0,
        Unit::Kelvin => value + KELVIN_OFFSET,

        Unit::Meter => value,
        Unit::Kilometer => value / METERS_PER_KILOMETER,
        Unit::Mile => value / METERS_PER_MILE,
        Unit::Foot => value / METERS_PER_FOOT,

        Unit::Centimeter => value,
        Unit::Millimeter => value * MILLIMETERS_PER_CENTIMETER,
        Unit::Inch => value / CENTIMETERS_PER_INCH,
        Unit::Yard => value / CENTIMETERS_PER_YARD,
        Unit::Apple => value / CENTIMETERS_PER_APPLE,

        Unit::Gram => value,
        Unit::Kilogram => value / GRAMS_PER_KILOGRAM,
        Unit::Pound => value / GRAMS_PER_POUND,
        Unit::Ounce => value / GRAMS_PER_OUNCE,

        Unit::Milliliter => value,
        Unit::Liter => value / MILLILITERS_PER_LITER,
        Unit::Gallon => value / MILLILITERS_PER_GALLON,
        Unit::FluidOunce => value / MILLILITERS_PER_FLUID_OUNCE,
    }
}

/// Convert a value between two units of the same quantity.
///
/// Converting a unit to itself returns the value untouched. A result that
/// is not finite (including overflow on the way through the base unit) is
/// an [`ConversionError::InvalidNumber`].
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, ConversionError> {
    if !from.is_compatible(to) {
        return Err(ConversionError::incompatible(from, to));
    }
    let converted = if from == to { value } else { from_base(to_base(value, from), to) };
    if !converted.is_finite() {
        return Err(ConversionError::InvalidNumber(format!("{}{}", value, from)));
    }
    Ok(converted)
}

/// Convert within a declared quantity, checking both units belong to it
pub fn convert_quantity(
    quantity: QuantityType,
    value: f64,
    from: Unit,
    to: Unit,
) -> Result<f64, ConversionError> {
    if from.quantity() != quantity {
        return Err(ConversionError::incompatible(from, quantity.base_unit()));
    }
    convert(value, from, to)
}

/// Format a value with the display suffix of `unit`
pub fn format_unit(value: f64, unit: Unit, options: &FormatOptions) -> String {
    format_value(value, unit.display_suffix(), options)
}

/// Convert and format in one step, producing both display strings
pub fn convert_unit(
    quantity: QuantityType,
    value: f64,
    from: Unit,
    to: Unit,
    options: &FormatOptions,
) -> Result<ConversionResult, ConversionError> {
    let converted = convert_quantity(quantity, value, from, to)?;
    Ok(ConversionResult {
        original: format_unit(value, from, options),
        converted: format_unit(converted, to, options),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} to be within {} of {}",
            actual, tolerance, expected
        );
    }

    #[test]
    fn test_temperature() {
        assert_close(convert(0.0, Unit::Celsius, Unit::Kelvin).unwrap(), 273.15);
        assert_close(convert(212.0, Unit::Fahrenheit, Unit::Celsius).unwrap(), 100.0);
        assert_close(convert(-40.0, Unit::Celsius, Unit::Fahrenheit).unwrap(), -40.0);
        assert_close(convert(0.0, Unit::Kelvin, Unit::Fahrenheit).unwrap(), -459.67);
    }

    #[test]
    fn test_distance() {
        assert_close(convert(1.0, Unit::Mile, Unit::Meter).unwrap(), 1609.344);
        assert_close(convert(100.0, Unit::Kilometer, Unit::Mile).unwrap(), 62.137119223733395);
        assert_close(convert(1000.0, Unit::Foot, Unit::Meter).unwrap(), 304.8);
    }

    #[test]
    fn test_length() {
        assert_close(convert(1.0, Unit::Yard, Unit::Inch).unwrap(), 36.0);
        assert_close(convert(25.0, Unit::Millimeter, Unit::Centimeter).unwrap(), 2.5);
        assert_close(convert(2.0, Unit::Apple, Unit::Centimeter).unwrap(), 15.0);
    }

    #[test]
    fn test_weight_and_volume() {
        assert_close(convert(1.0, Unit::Pound, Unit::Gram).unwrap(), 453.592);
        assert_close(convert(2.0, Unit::Kilogram, Unit::Gram).unwrap(), 2000.0);
        assert_close(convert(1.0, Unit::Gallon, Unit::Liter).unwrap(), 3.78541);
        assert_close(convert(1.0, Unit::FluidOunce, Unit::Milliliter).unwrap(), 29.5735);
    }

    #[test]
    fn test_identity_is_exact() {
        for quantity in QuantityType::ALL {
            for &unit in quantity.units() {
                for value in [0.1, -12.3, 1e-7, 98765.4321, 0.0] {
                    assert_eq!(convert(value, unit, unit).unwrap(), value);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_every_pair() {
        for quantity in QuantityType::ALL {
            for &a in quantity.units() {
                for &b in quantity.units() {
                    for value in [1.0, -40.0, 32.2, 1234.5678] {
                        let there = convert(value, a, b).unwrap();
                        let back = convert(there, b, a).unwrap();
                        assert_close(back, value);
                    }
                }
            }
        }
    }

    #[test]
    fn test_incompatible_units() {
        let err = convert(1.0, Unit::Kilometer, Unit::Kilogram).unwrap_err();
        assert!(matches!(err, ConversionError::IncompatibleUnits { .. }));
        assert!(err.to_string().contains("distance"));

        let err = convert_quantity(QuantityType::Weight, 1.0, Unit::Liter, Unit::Liter);
        assert!(err.is_err());
    }

    #[test]
    fn test_convert_unit_formats_both_sides() {
        let options = FormatOptions { decimal_places: 2, auto_trim: false, max_decimal_places: 6 };
        let result = convert_unit(QuantityType::Temperature, 25.0, Unit::Celsius, Unit::Kelvin, &options).unwrap();
        assert_eq!(result.original, "25,00°C");
        assert_eq!(result.converted, "298,15K");
    }

    #[test]
    fn test_overflow_is_rejected() {
        let err = convert(1e306, Unit::Kilometer, Unit::Meter).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNumber(_)));
        assert!(convert(f64::INFINITY, Unit::Meter, Unit::Meter).is_err());
        assert!(convert(f64::NAN, Unit::Celsius, Unit::Kelvin).is_err());

        let options = FormatOptions::default();
        let err = convert_unit(QuantityType::Distance, f64::MAX, Unit::Mile, Unit::Meter, &options);
        assert!(matches!(err, Err(ConversionError::InvalidNumber(_))));
    }
}
