//! Pre-send expansion
//!
//! Before a message leaves the client, `<u:14km:mi,m>` becomes
//! `14km` + [`PROCESSED_MARKER`] + ` (8,7mi & 14000m)`. The marker tells the
//! annotation pipeline on the receiving side to leave the text alone.

use tracing::debug;
use unitext_core::convert::format_unit;
use unitext_core::{convert, FormatOptions, Preferences};
use crate::grammar::{self, Grammar, PresendTag};

/// Zero-width marker appended to expanded pre-send tags
pub const PROCESSED_MARKER: char = '\u{200B}';

/// Expand every pre-send tag in `text`.
///
/// Emoji inside `<u...>` regions are backslash-escaped first, and that
/// escaping stays in the output. Tags with no usable target are left as
/// written.
pub fn expand(grammar: &Grammar, text: &str, prefs: &Preferences) -> String {
    let defused = grammar::defuse_emoji(text);
    let tags = grammar.presend_tags(&defused);
    if tags.is_empty() {
        return defused;
    }

    let options = prefs.format_options();
    let mut out = String::with_capacity(defused.len() + tags.len() * 16);
    let mut last = 0;
    for tag in &tags {
        out.push_str(&defused[last..tag.span.start]);
        match expand_tag(grammar, tag, &options) {
            Some(expanded) => out.push_str(&expanded),
            None => out.push_str(&defused[tag.span.clone()]),
        }
        last = tag.span.end;
    }
    out.push_str(&defused[last..]);
    out
}

fn expand_tag(grammar: &Grammar, tag: &PresendTag<'_>, options: &FormatOptions) -> Option<String> {
    let registry = grammar.registry();
    let (quantity, from) = registry.lookup(tag.unit)?;
    let value = grammar::parse_value(tag.value)?;

    let conversions: Vec<String> = tag
        .target_names()
        .filter_map(|name| registry.lookup(name))
        .filter(|&(q, to)| q == quantity && to != from)
        .filter_map(|(_, to)| convert(value, from, to).ok().map(|v| format_unit(v, to, options)))
        .collect();

    if conversions.is_empty() {
        debug!(tag = %tag.literal(), "no usable pre-send targets");
        return None;
    }

    Some(format!(
        "{}{} ({})",
        format_unit(value, from, options),
        PROCESSED_MARKER,
        join_conversions(&conversions)
    ))
}

/// `a`, `a & b`, `a, b & c`
pub fn join_conversions(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} & {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GRAMMAR;
    use unitext_core::Unit;

    fn trimmed(places: u32) -> Preferences {
        Preferences::default().with_decimals(places, true, places)
    }

    #[test]
    fn test_expand_two_targets() {
        let out = expand(&GRAMMAR, "<u:14km:mi,m>", &trimmed(1));
        assert_eq!(out, "14km\u{200B} (8,7mi & 14000m)");
    }

    #[test]
    fn test_expand_keeps_surrounding_text() {
        let out = expand(&GRAMMAR, "ran <u:5 km:mi> today", &Preferences::default());
        assert_eq!(out, "ran 5,00km\u{200B} (3,11mi) today");
    }

    #[test]
    fn test_skips_foreign_and_identical_targets() {
        let out = expand(&GRAMMAR, "<u:25°C:C,kg,F>", &trimmed(2));
        assert_eq!(out, "25°C\u{200B} (77°F)");
    }

    #[test]
    fn test_no_surviving_targets_left_unchanged() {
        let text = "<u:25°C:c,kg>";
        assert_eq!(expand(&GRAMMAR, text, &Preferences::default()), text);
    }

    #[test]
    fn test_backslash_guard() {
        let text = r"\<u:14km:mi>";
        assert_eq!(expand(&GRAMMAR, text, &Preferences::default()), text);
    }

    #[test]
    fn test_emoji_defused_inside_tags() {
        let prefs = Preferences::default().with_preferred(Unit::Centimeter);
        let out = expand(&GRAMMAR, "<u:2🍎:cm> 🍎", &prefs);
        assert_eq!(out, "<u:2\\🍎:cm> 🍎");
    }

    #[test]
    fn test_join_conversions() {
        let parts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_conversions(&parts[..1]), "a");
        assert_eq!(join_conversions(&parts[..2]), "a & b");
        assert_eq!(join_conversions(&parts), "a, b & c");
    }
}
