//! Unit representation

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::QuantityType;

/// A unit of measurement known to the registry.
///
/// Serialises as its canonical symbol, which is also what settings files
/// and tag syntax use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    // Temperature
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
    #[serde(rename = "K")]
    Kelvin,

    // Distance
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "mi")]
    Mile,
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "ft")]
    Foot,

    // Length
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "in")]
    Inch,
    #[serde(rename = "yd")]
    Yard,
    #[serde(rename = "🍎")]
    Apple,

    // Weight
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "lb")]
    Pound,
    #[serde(rename = "g")]
    Gram,
    #[serde(rename = "oz")]
    Ounce,

    // Volume
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "gal")]
    Gallon,
    #[serde(rename = "ml")]
    Milliliter,
    #[serde(rename = "floz")]
    FluidOunce,
}

impl Unit {
    /// Canonical symbol (e.g. "km", "C", "floz")
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Celsius => "C",
            Unit::Fahrenheit => "F",
            Unit::Kelvin => "K",
            Unit::Kilometer => "km",
            Unit::Mile => "mi",
            Unit::Meter => "m",
            Unit::Foot => "ft",
            Unit::Centimeter => "cm",
            Unit::Millimeter => "mm",
            Unit::Inch => "in",
            Unit::Yard => "yd",
            Unit::Apple => "🍎",
            Unit::Kilogram => "kg",
            Unit::Pound => "lb",
            Unit::Gram => "g",
            Unit::Ounce => "oz",
            Unit::Liter => "L",
            Unit::Gallon => "gal",
            Unit::Milliliter => "ml",
            Unit::FluidOunce => "floz",
        }
    }

    /// Human-readable label for settings screens
    pub fn label(self) -> &'static str {
        match self {
            Unit::Celsius => "Celsius",
            Unit::Fahrenheit => "Fahrenheit",
            Unit::Kelvin => "Kelvin",
            Unit::Kilometer => "Kilometers",
            Unit::Mile => "Miles",
            Unit::Meter => "Meters",
            Unit::Foot => "Feet",
            Unit::Centimeter => "Centimeters",
            Unit::Millimeter => "Millimeters",
            Unit::Inch => "Inches",
            Unit::Yard => "Yards",
            Unit::Apple => "🍎",
            Unit::Kilogram => "Kilograms",
            Unit::Pound => "Pounds",
            Unit::Gram => "Grams",
            Unit::Ounce => "Ounces",
            Unit::Liter => "Liters",
            Unit::Gallon => "Gallons",
            Unit::Milliliter => "Milliliters",
            Unit::FluidOunce => "Fluid Ounces",
        }
    }

    /// The quantity this unit measures
    pub fn quantity(self) -> QuantityType {
        match self {
            Unit::Celsius | Unit::Fahrenheit | Unit::Kelvin => QuantityType::Temperature,
            Unit::Kilometer | Unit::Mile | Unit::Meter | Unit::Foot => QuantityType::Distance,
            Unit::Centimeter | Unit::Millimeter | Unit::Inch | Unit::Yard | Unit::Apple => {
                QuantityType::Length
            }
            Unit::Kilogram | Unit::Pound | Unit::Gram | Unit::Ounce => QuantityType::Weight,
            Unit::Liter | Unit::Gallon | Unit::Milliliter | Unit::FluidOunce => QuantityType::Volume,
        }
    }

    /// Suffix appended to formatted values.
    ///
    /// Kelvin is written bare, the other temperature scales carry a degree mark.
    pub fn display_suffix(self) -> &'static str {
        match self {
            Unit::Celsius => "°C",
            Unit::Fahrenheit => "°F",
            other => other.symbol(),
        }
    }

    /// Check if two units measure the same quantity
    pub fn is_compatible(self, other: Unit) -> bool {
        self.quantity() == other.quantity()
    }

    pub fn definition(self) -> UnitDefinition {
        UnitDefinition {
            unit: self,
            symbol: self.symbol(),
            label: self.label(),
            quantity: self.quantity(),
            base: self.quantity().base_unit() == self,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Serializable description of a unit, as listed to hosts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDefinition {
    pub unit: Unit,
    pub symbol: &'static str,
    pub label: &'static str,
    pub quantity: QuantityType,
    /// Whether this is the pivot unit of its quantity
    pub base: bool,
}
