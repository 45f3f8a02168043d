//! Quantity types - the five measurement domains recognised in text

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::{ConversionError, Unit};

/// One of the closed set of measurement domains.
///
/// Every quantity is addressed in tag syntax by a single letter
/// (`<uT:...>`, `<uD:...>`, ...) and carries an ordered unit list whose
/// first entry is the default display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    Temperature,
    Distance,
    Length,
    Weight,
    Volume,
}

impl QuantityType {
    /// All quantity types in tag-letter order
    pub const ALL: [QuantityType; 5] = [
        QuantityType::Temperature,
        QuantityType::Distance,
        QuantityType::Length,
        QuantityType::Weight,
        QuantityType::Volume,
    ];

    /// Letter used in `<uX:...>` tags
    pub fn letter(self) -> char {
        match self {
            QuantityType::Temperature => 'T',
            QuantityType::Distance => 'D',
            QuantityType::Length => 'L',
            QuantityType::Weight => 'W',
            QuantityType::Volume => 'V',
        }
    }

    /// Resolve a tag letter (case-insensitive)
    pub fn from_letter(c: char) -> Option<QuantityType> {
        match c.to_ascii_uppercase() {
            'T' => Some(QuantityType::Temperature),
            'D' => Some(QuantityType::Distance),
            'L' => Some(QuantityType::Length),
            'W' => Some(QuantityType::Weight),
            'V' => Some(QuantityType::Volume),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QuantityType::Temperature => "temperature",
            QuantityType::Distance => "distance",
            QuantityType::Length => "length",
            QuantityType::Weight => "weight",
            QuantityType::Volume => "volume",
        }
    }

    /// Settings key holding the preferred unit for this quantity
    pub fn setting_key(self) -> &'static str {
        match self {
            QuantityType::Temperature => "preferredTemperature",
            QuantityType::Distance => "preferredDistance",
            QuantityType::Length => "preferredLength",
            QuantityType::Weight => "preferredWeight",
            QuantityType::Volume => "preferredVolume",
        }
    }

    /// Units of this quantity; the first one is the default display unit
    pub fn units(self) -> &'static [Unit] {
        match self {
            QuantityType::Temperature => &[Unit::Celsius, Unit::Fahrenheit, Unit::Kelvin],
            QuantityType::Distance => &[Unit::Kilometer, Unit::Mile, Unit::Meter, Unit::Foot],
            QuantityType::Length => &[
                Unit::Centimeter,
                Unit::Millimeter,
                Unit::Inch,
                Unit::Yard,
                Unit::Apple,
            ],
            QuantityType::Weight => &[Unit::Kilogram, Unit::Pound, Unit::Gram, Unit::Ounce],
            QuantityType::Volume => &[Unit::Liter, Unit::Gallon, Unit::Milliliter, Unit::FluidOunce],
        }
    }

    /// Default display unit (first in the unit list)
    pub fn default_unit(self) -> Unit {
        self.units()[0]
    }

    /// Pivot unit for conversion arithmetic
    pub fn base_unit(self) -> Unit {
        match self {
            QuantityType::Temperature => Unit::Celsius,
            QuantityType::Distance => Unit::Meter,
            QuantityType::Length => Unit::Centimeter,
            QuantityType::Weight => Unit::Gram,
            QuantityType::Volume => Unit::Milliliter,
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl TryFrom<char> for QuantityType {
    type Error = ConversionError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        QuantityType::from_letter(c).ok_or(ConversionError::UnknownQuantity(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_round_trip() {
        for q in QuantityType::ALL {
            assert_eq!(QuantityType::from_letter(q.letter()), Some(q));
            assert_eq!(QuantityType::from_letter(q.letter().to_ascii_lowercase()), Some(q));
        }
        assert_eq!(QuantityType::from_letter('X'), None);
        assert_eq!(QuantityType::try_from('w'), Ok(QuantityType::Weight));
        assert_eq!(QuantityType::try_from('X'), Err(ConversionError::UnknownQuantity('X')));
    }

    #[test]
    fn test_default_units() {
        assert_eq!(QuantityType::Temperature.default_unit(), Unit::Celsius);
        assert_eq!(QuantityType::Distance.default_unit(), Unit::Kilometer);
        assert_eq!(QuantityType::Length.default_unit(), Unit::Centimeter);
        assert_eq!(QuantityType::Weight.default_unit(), Unit::Kilogram);
        assert_eq!(QuantityType::Volume.default_unit(), Unit::Liter);
    }

    #[test]
    fn test_units_belong_to_their_quantity() {
        for q in QuantityType::ALL {
            for unit in q.units() {
                assert_eq!(unit.quantity(), q);
            }
            assert_eq!(q.base_unit().quantity(), q);
        }
    }
}
