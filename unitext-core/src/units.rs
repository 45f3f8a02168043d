//! Unit registry - natural-language unit names generated from the per-quantity unit lists

use std::collections::HashMap;
use std::sync::LazyLock;
use crate::{ConversionError, QuantityType, Unit};

/// Global unit registry
pub static UNITS: LazyLock<UnitRegistry> = LazyLock::new(UnitRegistry::new);

/// Immutable mapping from lowercase unit names to their quantity and unit.
///
/// Built once from [`QuantityType::units`], so the grammar derived from
/// [`UnitRegistry::names_longest_first`] and the lookup can never disagree.
pub struct UnitRegistry {
    units: HashMap<String, (QuantityType, Unit)>,
    names: Vec<String>,
}

impl UnitRegistry {
    pub fn new() -> Self {
        let mut registry = UnitRegistry {
            units: HashMap::new(),
            names: Vec::new(),
        };
        registry.register_all_units();
        registry.sort_names();
        registry
    }

    /// Look up a unit by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<(QuantityType, Unit)> {
        if let Some(entry) = self.units.get(name) {
            return Some(*entry);
        }
        self.units.get(&name.to_lowercase()).copied()
    }

    /// Like [`UnitRegistry::lookup`], failing with [`ConversionError::UnknownUnit`]
    pub fn resolve(&self, name: &str) -> Result<(QuantityType, Unit), ConversionError> {
        self.lookup(name)
            .ok_or_else(|| ConversionError::UnknownUnit(name.to_string()))
    }

    /// Every registered name, longest first.
    ///
    /// Ties are broken alphabetically so the order is stable across runs.
    pub fn names_longest_first(&self) -> &[String] {
        &self.names
    }

    /// Number of registered names (aliases included)
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn register(&mut self, name: String, quantity: QuantityType, unit: Unit) {
        self.units.insert(name, (quantity, unit));
    }

    fn register_all_units(&mut self) {
        for quantity in QuantityType::ALL {
            for &unit in quantity.units() {
                let lower = unit.symbol().to_lowercase();
                // Temperature is also written with a degree mark (°C, °F, °K)
                if quantity == QuantityType::Temperature {
                    self.register(format!("°{}", lower), quantity, unit);
                }
                self.register(lower, quantity, unit);
            }
        }
    }

    fn sort_names(&mut self) {
        let mut names: Vec<String> = self.units.keys().cloned().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self.names = names;
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
