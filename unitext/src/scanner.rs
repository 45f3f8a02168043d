//! Measurement scanner
//!
//! Two passes over shielded text. The explicit pass takes every
//! well-formed `<uX:...>` tag whose unit belongs to the declared quantity.
//! The natural pass (only with auto-detection on) adds `value unit`
//! mentions that are not inside a tag, a pre-send tag or a malformed
//! `<u...>` region and that do not overlap anything already accepted.

use std::ops::Range;
use tracing::{debug, trace};
use unitext_core::{QuantityType, Unit};
use crate::grammar::{self, Grammar, NaturalMention, UnitTag};
use crate::resolve::Resolver;

/// Where a match came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Explicit,
    Natural,
}

/// A resolved measurement in the scanned text
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Byte range in the shielded text
    pub span: Range<usize>,
    pub quantity: QuantityType,
    pub value: f64,
    pub unit: Unit,
    /// Display unit requested by the tag, if it matched the quantity
    pub override_unit: Option<Unit>,
    pub source: MatchSource,
}

impl Match {
    pub fn overlaps(&self, span: &Range<usize>) -> bool {
        span.start < self.span.end && span.end > self.span.start
    }
}

pub struct Scanner<'g> {
    grammar: &'g Grammar,
}

impl<'g> Scanner<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Scanner { grammar }
    }

    /// Run both passes and return matches ordered by start offset
    pub fn scan(&self, text: &str, auto_detect: bool) -> Vec<Match> {
        let mut resolver = Resolver::new(self.explicit_matches(text));
        if auto_detect {
            self.natural_pass(text, &mut resolver);
        }
        resolver.into_sorted()
    }

    pub fn explicit_matches(&self, text: &str) -> Vec<Match> {
        self.grammar
            .unit_tags(text)
            .iter()
            .filter_map(|tag| self.resolve_tag(tag))
            .collect()
    }

    fn natural_pass(&self, text: &str, resolver: &mut Resolver) {
        for tag in self.grammar.presend_tags(text) {
            resolver.exclude(tag.span);
        }
        for region in grammar::unit_regions(text) {
            resolver.exclude(region);
        }

        for mention in self.grammar.natural_mentions(text) {
            let Some(m) = self.resolve_mention(&mention) else {
                continue;
            };
            if let Err(reason) = resolver.offer(m) {
                trace!(text = &text[mention.span.clone()], %reason, "natural mention skipped");
            }
        }
    }

    fn resolve_tag(&self, tag: &UnitTag<'_>) -> Option<Match> {
        let registry = self.grammar.registry();
        let quantity = QuantityType::from_letter(tag.letter)?;

        let Some((unit_quantity, unit)) = registry.lookup(tag.unit) else {
            trace!(unit = tag.unit, "unknown unit in tag");
            return None;
        };
        if unit_quantity != quantity {
            debug!(
                declared = quantity.name(),
                unit = tag.unit,
                "tag unit does not belong to the declared quantity"
            );
            return None;
        }
        let Some(value) = grammar::parse_value(tag.value) else {
            debug!(value = tag.value, "unparseable tag value");
            return None;
        };

        let override_unit = tag.override_unit.and_then(|name| match registry.lookup(name) {
            Some((q, over)) if q == quantity => Some(over),
            _ => {
                debug!(unit = name, "override ignored, wrong quantity");
                None
            }
        });

        Some(Match {
            span: tag.span.clone(),
            quantity,
            value,
            unit,
            override_unit,
            source: MatchSource::Explicit,
        })
    }

    fn resolve_mention(&self, mention: &NaturalMention<'_>) -> Option<Match> {
        let (quantity, unit) = self.grammar.registry().lookup(mention.unit)?;
        let Some(value) = grammar::parse_value(mention.value) else {
            trace!(value = mention.value, "unparseable natural value");
            return None;
        };
        Some(Match {
            span: mention.span.clone(),
            quantity,
            value,
            unit,
            override_unit: None,
            source: MatchSource::Natural,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GRAMMAR;

    fn scan(text: &str) -> Vec<Match> {
        Scanner::new(&GRAMMAR).scan(text, true)
    }

    #[test]
    fn test_explicit_tag_resolves() {
        let matches = scan("<uT:25°C>");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].quantity, QuantityType::Temperature);
        assert_eq!(matches[0].unit, Unit::Celsius);
        assert_eq!(matches[0].value, 25.0);
        assert_eq!(matches[0].source, MatchSource::Explicit);
    }

    #[test]
    fn test_tag_with_wrong_quantity_dropped() {
        assert!(Scanner::new(&GRAMMAR).explicit_matches("<uT:5km>").is_empty());
        // the tag region still keeps the natural pass out
        assert!(scan("<uT:5km>").is_empty());
    }

    #[test]
    fn test_override_of_other_quantity_ignored() {
        let matches = scan("<uD:10km:kg>");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].override_unit, None);

        let matches = scan("<uD:10km:mi>");
        assert_eq!(matches[0].override_unit, Some(Unit::Mile));
    }

    #[test]
    fn test_natural_inside_tag_not_duplicated() {
        let matches = scan("<uD:5km> and 3mi");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].source, MatchSource::Explicit);
        assert_eq!(matches[1].source, MatchSource::Natural);
        assert_eq!(matches[1].unit, Unit::Mile);
    }

    #[test]
    fn test_natural_excluded_from_presend_and_malformed_regions() {
        assert!(scan("<u:14km:mi>").is_empty());
        assert!(scan("<uX:5km>").is_empty());
        assert_eq!(scan("<uD:5km").len(), 1);
    }

    #[test]
    fn test_auto_detect_off() {
        let matches = Scanner::new(&GRAMMAR).scan("5km and <uW:2kg>", false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].unit, Unit::Kilogram);
    }

    #[test]
    fn test_matches_sorted() {
        let matches = scan("3mi then <uD:5km> then 4 ft");
        let units: Vec<_> = matches.iter().map(|m| m.unit).collect();
        assert_eq!(units, vec![Unit::Mile, Unit::Kilometer, Unit::Foot]);
        assert!(matches.windows(2).all(|w| w[0].span.end <= w[1].span.start));
    }

    #[test]
    fn test_unparseable_value_skipped() {
        assert!(scan("... km").is_empty());
        assert!(scan("<uD:.,km>").is_empty());
    }
}
