//! Value formatting: fixed-point rounding, optional trimming, comma decimals

use serde::{Serialize, Deserialize};
use crate::settings::MAX_DECIMAL_PLACES;

/// Character written in place of the decimal point
pub const DECIMAL_SEPARATOR: char = ',';

/// Digits examined past the requested precision when rounding.
///
/// An f64 whose exact decimal expansion sits on a rounding tie has at most
/// one digit beyond the precision, so a run of forty guard digits can never
/// turn a near-tie into a false one.
const GUARD_DIGITS: usize = 40;

/// Per-text-unit formatting snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    pub decimal_places: u32,
    /// Use up to `max_decimal_places` and strip trailing zeros
    pub auto_trim: bool,
    pub max_decimal_places: u32,
}

impl FormatOptions {
    /// Effective number of fraction digits before trimming, at most
    /// [`MAX_DECIMAL_PLACES`]
    pub fn precision(&self) -> usize {
        let digits = if self.auto_trim {
            self.max_decimal_places.max(self.decimal_places)
        } else {
            self.decimal_places
        };
        digits.min(MAX_DECIMAL_PLACES) as usize
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        FormatOptions {
            decimal_places: 2,
            auto_trim: false,
            max_decimal_places: 6,
        }
    }
}

/// Format a value for display and append `suffix` with no space
pub fn format_value(value: f64, suffix: &str, options: &FormatOptions) -> String {
    let mut formatted = to_fixed(value, options.precision());
    if options.auto_trim {
        trim_fraction(&mut formatted);
    }
    let formatted = formatted.replacen('.', &DECIMAL_SEPARATOR.to_string(), 1);
    format!("{}{}", formatted, suffix)
}

/// Round to `digits` fraction digits, ties away from zero.
///
/// Rounding works on the exact decimal expansion of the float, so
/// `to_fixed(2.5, 0)` is `"3"` and `to_fixed(1.005, 2)` is `"1.00"`
/// (1.005 is stored slightly below the tie). Zero never carries a sign.
/// `digits` is capped at [`MAX_DECIMAL_PLACES`].
pub fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.min(MAX_DECIMAL_PLACES as usize);

    let expanded = format!("{:.*}", digits + GUARD_DIGITS, value.abs());
    let (int_part, frac_part) = expanded.split_once('.').unwrap_or((expanded.as_str(), ""));

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .map(|b| b - b'0')
        .collect();

    let round_up = frac_part.as_bytes().get(digits).is_some_and(|&b| b >= b'5');
    if round_up {
        increment(&mut kept);
    }

    let int_len = kept.len() - digits;
    let mut out = String::with_capacity(kept.len() + 2);
    if value.is_sign_negative() && kept.iter().any(|&d| d != 0) {
        out.push('-');
    }
    out.extend(kept[..int_len].iter().map(|&d| char::from(b'0' + d)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[int_len..].iter().map(|&d| char::from(b'0' + d)));
    }
    out
}

/// Add one unit in the last place of a decimal digit string
fn increment(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, 1);
}

/// Strip trailing zeros and a dangling point from the fractional part only
fn trim_fraction(s: &mut String) {
    if !s.contains('.') {
        return;
    }
    let trimmed_len = s.trim_end_matches('0').trim_end_matches('.').len();
    s.truncate(trimmed_len);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(decimal_places: u32, auto_trim: bool, max_decimal_places: u32) -> FormatOptions {
        FormatOptions { decimal_places, auto_trim, max_decimal_places }
    }

    #[test]
    fn test_to_fixed_rounds_ties_away_from_zero() {
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(0.25, 1), "0.3");
        assert_eq!(to_fixed(-1.5, 0), "-2");
    }

    #[test]
    fn test_to_fixed_uses_exact_value() {
        // 1.005 is stored as 1.00499999999999989...
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(298.15, 2), "298.15");
        assert_eq!(to_fixed(62.13711922373339, 2), "62.14");
    }

    #[test]
    fn test_to_fixed_carries() {
        assert_eq!(to_fixed(99.996, 2), "100.00");
        assert_eq!(to_fixed(9.5, 0), "10");
        assert_eq!(to_fixed(0.0, 3), "0.000");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(to_fixed(-0.001, 2), "0.00");
        assert_eq!(to_fixed(-0.0, 0), "0");
        assert_eq!(to_fixed(-0.006, 2), "-0.01");
    }

    #[test]
    fn test_format_value_fixed() {
        assert_eq!(format_value(62.13711922373339, "mi", &options(2, false, 6)), "62,14mi");
        assert_eq!(format_value(25.0, "°C", &options(2, false, 6)), "25,00°C");
        assert_eq!(format_value(14.0, "km", &options(0, false, 6)), "14km");
    }

    #[test]
    fn test_format_value_auto_trim() {
        assert_eq!(format_value(14.0, "km", &options(2, true, 6)), "14km");
        assert_eq!(format_value(8.699196691322676, "mi", &options(2, true, 6)), "8,699197mi");
        assert_eq!(format_value(0.0005, "kg", &options(2, true, 6)), "0,0005kg");
        assert_eq!(format_value(12.5, "L", &options(2, true, 6)), "12,5L");
    }

    #[test]
    fn test_trim_keeps_integer_zeros() {
        assert_eq!(format_value(100.0, "m", &options(0, true, 0)), "100m");
        assert_eq!(format_value(14000.0, "m", &options(1, true, 1)), "14000m");
    }

    #[test]
    fn test_precision() {
        assert_eq!(options(2, false, 6).precision(), 2);
        assert_eq!(options(2, true, 6).precision(), 6);
        assert_eq!(options(8, true, 6).precision(), 8);
    }

    #[test]
    fn test_precision_is_capped() {
        assert_eq!(options(200, false, 6).precision(), MAX_DECIMAL_PLACES as usize);
        assert_eq!(options(2, true, u32::MAX).precision(), MAX_DECIMAL_PLACES as usize);
        assert_eq!(format_value(1.0, "km", &options(200, false, 6)), "1,000000000000km");
        assert_eq!(format_value(1.5, "km", &options(u32::MAX, true, u32::MAX)), "1,5km");
        assert_eq!(to_fixed(0.25, usize::MAX), "0.250000000000");
    }
}
