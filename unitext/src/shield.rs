//! Escape shielding
//!
//! Escaped tags (`<!uT:25°C>`, `<!u:14km:mi>`) are swapped for opaque
//! placeholders before scanning so neither pass can see them, then restored
//! as the literal tag without the `!` when segments are assembled.

use std::sync::OnceLock;
use regex::{Captures, Regex};
use crate::grammar::Grammar;

/// Delimits placeholder tokens. Never produced by the unit grammar.
pub const PLACEHOLDER_DELIMITER: char = '\u{200D}';

/// Text with escaped tags replaced by placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Shielded {
    text: String,
    literals: Vec<String>,
}

impl Shielded {
    /// Shield every escaped explicit tag, then every escaped pre-send tag
    pub fn new(text: &str, grammar: &Grammar) -> Self {
        let mut literals = Vec::new();

        let tags = grammar.escaped_unit_tags(text);
        let spans: Vec<_> = tags.iter().map(|t| (t.span.clone(), t.literal())).collect();
        let text = replace_spans(text, spans, &mut literals);

        let tags = grammar.escaped_presend_tags(&text);
        let spans: Vec<_> = tags.iter().map(|t| (t.span.clone(), t.literal())).collect();
        let text = replace_spans(&text, spans, &mut literals);

        Shielded { text, literals }
    }

    /// The shielded text the scanner runs over
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of shielded tags
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Put the literal tags back into a slice of the shielded text.
    ///
    /// A placeholder whose index is unknown is left as it is.
    pub fn restore(&self, fragment: &str) -> String {
        if self.literals.is_empty() || !fragment.contains(PLACEHOLDER_DELIMITER) {
            return fragment.to_string();
        }
        placeholder_regex()
            .replace_all(fragment, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.literals.get(i))
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Placeholder token for literal number `index`
pub fn placeholder(index: usize) -> String {
    format!("{d}ESCAPED_UNIT_{index}{d}", d = PLACEHOLDER_DELIMITER)
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x{200D}ESCAPED_UNIT_(\d+)\x{200D}").unwrap())
}

fn replace_spans(
    text: &str,
    spans: Vec<(std::ops::Range<usize>, String)>,
    literals: &mut Vec<String>,
) -> String {
    if spans.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (span, literal) in spans {
        out.push_str(&text[last..span.start]);
        out.push_str(&placeholder(literals.len()));
        literals.push(literal);
        last = span.end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GRAMMAR;

    #[test]
    fn test_shield_and_restore() {
        let shielded = Shielded::new("a <!uT:25°C> b <!u:14km:mi> c", &GRAMMAR);
        assert_eq!(shielded.len(), 2);
        assert!(!shielded.text().contains('<'));
        assert_eq!(shielded.restore(shielded.text()), "a <uT:25°C> b <u:14km:mi> c");
    }

    #[test]
    fn test_shielded_text_has_no_tags() {
        let shielded = Shielded::new("<!uD:5 km:mi>", &GRAMMAR);
        assert!(GRAMMAR.unit_tags(shielded.text()).is_empty());
        assert!(GRAMMAR.natural_mentions(shielded.text()).is_empty());
        assert_eq!(shielded.restore(shielded.text()), "<uD:5km:mi>");
    }

    #[test]
    fn test_nothing_to_shield() {
        let shielded = Shielded::new("plain <uT:5C>", &GRAMMAR);
        assert!(shielded.is_empty());
        assert_eq!(shielded.text(), "plain <uT:5C>");
    }

    #[test]
    fn test_unknown_placeholder_left_alone() {
        let shielded = Shielded::new("<!uT:5C>", &GRAMMAR);
        let stray = format!("x{}y", placeholder(7));
        assert_eq!(shielded.restore(&stray), stray);
    }

    #[test]
    fn test_restore_partial_fragment() {
        let shielded = Shielded::new("<!uT:1C> then <!uT:2C>", &GRAMMAR);
        let text = shielded.text();
        let tail = &text[text.find(" then ").unwrap()..];
        assert_eq!(shielded.restore(tail), " then <uT:2C>");
    }
}
