//! User preferences - the read-only settings snapshot consulted per text unit

use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};
use tracing::warn;
use crate::{FormatOptions, QuantityType, SettingsError, Unit};

/// Largest supported number of fraction digits
pub const MAX_DECIMAL_PLACES: u32 = 12;

/// Display preferences.
///
/// Field names follow the settings-store keys (`autoDetect`,
/// `preferredDistance`, ...). Every field is optional in JSON and falls
/// back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Detect `32.2km`-style mentions without tag syntax
    pub auto_detect: bool,
    /// Fraction digits to display (minimum when auto decimals are on)
    pub decimal_places: u32,
    /// Widen precision for small values and trim trailing zeros
    pub auto_decimal_places: bool,
    pub max_decimal_places: u32,
    pub preferred_temperature: Unit,
    pub preferred_distance: Unit,
    pub preferred_length: Unit,
    pub preferred_weight: Unit,
    pub preferred_volume: Unit,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            auto_detect: true,
            decimal_places: 2,
            auto_decimal_places: false,
            max_decimal_places: 6,
            preferred_temperature: QuantityType::Temperature.default_unit(),
            preferred_distance: QuantityType::Distance.default_unit(),
            preferred_length: QuantityType::Length.default_unit(),
            preferred_weight: QuantityType::Weight.default_unit(),
            preferred_volume: QuantityType::Volume.default_unit(),
        }
    }
}

impl Preferences {
    /// Parse preferences from JSON
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let prefs: Preferences = serde_json::from_str(json)?;
        Ok(prefs)
    }

    /// Load preferences from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Builder: set auto-detection
    pub fn with_auto_detect(mut self, enabled: bool) -> Self {
        self.auto_detect = enabled;
        self
    }

    /// Builder: set decimal handling
    pub fn with_decimals(mut self, decimal_places: u32, auto: bool, max_decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self.auto_decimal_places = auto;
        self.max_decimal_places = max_decimal_places;
        self
    }

    /// Builder: set the preferred unit for the unit's own quantity
    pub fn with_preferred(mut self, unit: Unit) -> Self {
        *self.slot_mut(unit.quantity()) = unit;
        self
    }

    /// Preferred display unit for a quantity.
    ///
    /// A unit stored in the wrong slot is ignored in favour of the
    /// quantity's default unit.
    pub fn preferred_unit(&self, quantity: QuantityType) -> Unit {
        let unit = self.slot(quantity);
        if unit.quantity() == quantity {
            unit
        } else {
            quantity.default_unit()
        }
    }

    /// Formatting snapshot for one text unit
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            decimal_places: self.decimal_places,
            auto_trim: self.auto_decimal_places,
            max_decimal_places: self.max_decimal_places,
        }
    }

    /// Report values a settings screen would reject
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("decimalPlaces", self.decimal_places),
            ("maxDecimalPlaces", self.max_decimal_places),
        ] {
            if value > MAX_DECIMAL_PLACES {
                return Err(SettingsError::OutOfRange { field, value: value as i64 });
            }
        }
        if self.max_decimal_places < self.decimal_places {
            return Err(SettingsError::OutOfRange {
                field: "maxDecimalPlaces",
                value: self.max_decimal_places as i64,
            });
        }
        for quantity in QuantityType::ALL {
            let unit = self.slot(quantity);
            if unit.quantity() != quantity {
                return Err(SettingsError::WrongQuantity {
                    field: quantity.setting_key(),
                    expected: quantity.name(),
                    unit,
                });
            }
        }
        Ok(())
    }

    /// Clamp and repair values so the snapshot is always usable
    pub fn sanitized(mut self) -> Self {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            warn!(value = self.decimal_places, "decimalPlaces clamped to {}", MAX_DECIMAL_PLACES);
            self.decimal_places = MAX_DECIMAL_PLACES;
        }
        if self.max_decimal_places > MAX_DECIMAL_PLACES {
            warn!(value = self.max_decimal_places, "maxDecimalPlaces clamped to {}", MAX_DECIMAL_PLACES);
            self.max_decimal_places = MAX_DECIMAL_PLACES;
        }
        if self.max_decimal_places < self.decimal_places {
            self.max_decimal_places = self.decimal_places;
        }
        for quantity in QuantityType::ALL {
            let unit = self.slot(quantity);
            if unit.quantity() != quantity {
                warn!(
                    setting = quantity.setting_key(),
                    %unit,
                    "preferred unit belongs to another quantity, using default"
                );
                *self.slot_mut(quantity) = quantity.default_unit();
            }
        }
        self
    }

    fn slot(&self, quantity: QuantityType) -> Unit {
        match quantity {
            QuantityType::Temperature => self.preferred_temperature,
            QuantityType::Distance => self.preferred_distance,
            QuantityType::Length => self.preferred_length,
            QuantityType::Weight => self.preferred_weight,
            QuantityType::Volume => self.preferred_volume,
        }
    }

    fn slot_mut(&mut self, quantity: QuantityType) -> &mut Unit {
        match quantity {
            QuantityType::Temperature => &mut self.preferred_temperature,
            QuantityType::Distance => &mut self.preferred_distance,
            QuantityType::Length => &mut self.preferred_length,
            QuantityType::Weight => &mut self.preferred_weight,
            QuantityType::Volume => &mut self.preferred_volume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = Preferences::default();
        assert!(prefs.auto_detect);
        assert_eq!(prefs.preferred_unit(QuantityType::Distance), Unit::Kilometer);
        assert_eq!(prefs.preferred_unit(QuantityType::Volume), Unit::Liter);
        assert_eq!(prefs.format_options(), FormatOptions::default());
        assert!(prefs.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let prefs = Preferences::from_json_str(
            r#"{"autoDetect": false, "preferredDistance": "mi", "preferredTemperature": "F"}"#,
        )
        .unwrap();
        assert!(!prefs.auto_detect);
        assert_eq!(prefs.preferred_unit(QuantityType::Distance), Unit::Mile);
        assert_eq!(prefs.preferred_unit(QuantityType::Temperature), Unit::Fahrenheit);
        assert_eq!(prefs.decimal_places, 2);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let result = Preferences::from_json_str(r#"{"preferredDistance": "parsec"}"#);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_misplaced_unit() {
        let prefs = Preferences::from_json_str(r#"{"preferredDistance": "kg"}"#).unwrap();
        assert!(matches!(prefs.validate(), Err(SettingsError::WrongQuantity { .. })));
        assert_eq!(prefs.preferred_unit(QuantityType::Distance), Unit::Kilometer);

        let fixed = prefs.sanitized();
        assert_eq!(fixed.preferred_distance, Unit::Kilometer);
        assert!(fixed.validate().is_ok());
    }

    #[test]
    fn test_sanitize_decimals() {
        let prefs = Preferences::default().with_decimals(4, true, 2).sanitized();
        assert_eq!(prefs.max_decimal_places, 4);

        let prefs = Preferences::default().with_decimals(30, false, 40).sanitized();
        assert_eq!(prefs.decimal_places, MAX_DECIMAL_PLACES);
        assert_eq!(prefs.max_decimal_places, MAX_DECIMAL_PLACES);
    }

    #[test]
    fn test_validate_decimals() {
        let prefs = Preferences::default().with_decimals(3, true, 1);
        assert!(matches!(
            prefs.validate(),
            Err(SettingsError::OutOfRange { field: "maxDecimalPlaces", .. })
        ));
    }

    #[test]
    fn test_with_preferred() {
        let prefs = Preferences::default().with_preferred(Unit::Pound);
        assert_eq!(prefs.preferred_unit(QuantityType::Weight), Unit::Pound);
        assert_eq!(prefs.preferred_unit(QuantityType::Distance), Unit::Kilometer);
    }

    #[test]
    fn test_json_round_trip_keys() {
        let json = serde_json::to_value(Preferences::default()).unwrap();
        assert_eq!(json["preferredLength"], "cm");
        assert_eq!(json["autoDecimalPlaces"], false);
    }
}
