//! Tag and mention grammar
//!
//! Recognised forms (the `u` and the quantity letter are case-insensitive):
//!
//! | form              | syntax                                   |
//! |-------------------|------------------------------------------|
//! | explicit tag      | `<uX:value unit>` / `<uX:value unit:override>` |
//! | escaped tag       | `<!uX:value unit[:override]>`            |
//! | pre-send tag      | `<u:value unit:target1,target2,...>`     |
//! | escaped pre-send  | `<!u:value unit:targets>`                |
//! | unit region       | `<u` up to the next `>`                  |
//! | natural mention   | `value unit`, e.g. `32.2km`, `-12°C`     |
//!
//! `X` is one of `T D L W V`. A backslash directly before `<` disables the
//! explicit and pre-send forms. A natural mention may not start right after
//! `/` or inside another number.
//!
//! The unit vocabulary comes from the registry, so a name is matched here
//! exactly when [`UnitRegistry::lookup`] resolves it. Where several names
//! could start at the same offset the longest one that lets the rest of the
//! form match wins.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::{LazyLock, OnceLock};
use regex::Regex;
use unitext_core::{UnitRegistry, UNITS};

/// Grammar derived from the global unit registry
pub static GRAMMAR: LazyLock<Grammar> = LazyLock::new(|| Grammar::new(&UNITS));

/// `<uX:...>` tag, escaped or not
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTag<'t> {
    pub span: Range<usize>,
    pub letter: char,
    pub value: &'t str,
    pub unit: &'t str,
    pub override_unit: Option<&'t str>,
}

impl UnitTag<'_> {
    /// The tag as written, minus the escape `!` and any space before the unit
    pub fn literal(&self) -> String {
        match self.override_unit {
            Some(over) => format!("<u{}:{}{}:{}>", self.letter, self.value, self.unit, over),
            None => format!("<u{}:{}{}>", self.letter, self.value, self.unit),
        }
    }
}

/// `<u:value unit:targets>` tag, escaped or not
#[derive(Debug, Clone, PartialEq)]
pub struct PresendTag<'t> {
    pub span: Range<usize>,
    pub value: &'t str,
    pub unit: &'t str,
    /// Raw comma-separated target list
    pub targets: &'t str,
}

impl PresendTag<'_> {
    pub fn literal(&self) -> String {
        format!("<u:{}{}:{}>", self.value, self.unit, self.targets)
    }

    /// Target names, trimmed
    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.split(',').map(str::trim)
    }
}

/// Value followed by a unit in running text
#[derive(Debug, Clone, PartialEq)]
pub struct NaturalMention<'t> {
    pub span: Range<usize>,
    pub value: &'t str,
    pub unit: &'t str,
}

/// Pattern matcher built over a unit registry
pub struct Grammar {
    registry: &'static UnitRegistry,
}

impl Grammar {
    pub fn new(registry: &'static UnitRegistry) -> Self {
        Grammar { registry }
    }

    pub fn registry(&self) -> &'static UnitRegistry {
        self.registry
    }

    /// Unit names in matching priority order (longest first)
    pub fn unit_names(&self) -> &[String] {
        self.registry.names_longest_first()
    }

    /// All explicit tags not preceded by a backslash
    pub fn unit_tags<'t>(&self, text: &'t str) -> Vec<UnitTag<'t>> {
        scan(text, |b| b == b'<', |pos| {
            if preceded_by(text, pos, |c| c == '\\') {
                return None;
            }
            self.unit_tag_at(text, pos, false)
        })
    }

    /// All `<!uX:...>` tags
    pub fn escaped_unit_tags<'t>(&self, text: &'t str) -> Vec<UnitTag<'t>> {
        scan(text, |b| b == b'<', |pos| self.unit_tag_at(text, pos, true))
    }

    /// All pre-send tags not preceded by a backslash
    pub fn presend_tags<'t>(&self, text: &'t str) -> Vec<PresendTag<'t>> {
        scan(text, |b| b == b'<', |pos| {
            if preceded_by(text, pos, |c| c == '\\') {
                return None;
            }
            self.presend_tag_at(text, pos, false)
        })
    }

    /// All `<!u:...>` tags
    pub fn escaped_presend_tags<'t>(&self, text: &'t str) -> Vec<PresendTag<'t>> {
        scan(text, |b| b == b'<', |pos| self.presend_tag_at(text, pos, true))
    }

    /// All natural-format mentions, leftmost first, non-overlapping
    pub fn natural_mentions<'t>(&self, text: &'t str) -> Vec<NaturalMention<'t>> {
        scan(text, is_value_start, |pos| self.natural_at(text, pos))
    }

    /// Cheap probe: does the text contain at least one natural mention?
    pub fn has_natural_mention(&self, text: &str) -> bool {
        let bytes = text.as_bytes();
        (0..bytes.len()).any(|pos| is_value_start(bytes[pos]) && self.natural_at(text, pos).is_some())
    }

    fn unit_tag_at<'t>(&self, text: &'t str, pos: usize, escaped: bool) -> Option<(UnitTag<'t>, usize)> {
        let mut i = expect_open(text, pos, escaped)?;
        let letter = text[i..].chars().next().filter(|c| "TDLWVtdlwv".contains(*c))?;
        i += 1;
        i = expect_byte(text, i, b':')?;

        let value_end = scan_value(text, i)?;
        let value = &text[i..value_end];
        let unit_start = skip_spaces(text, value_end);

        for unit_end in self.unit_ends(text, unit_start) {
            let unit = &text[unit_start..unit_end];
            if let Some(over_start) = expect_byte(text, unit_end, b':') {
                for over_end in self.unit_ends(text, over_start) {
                    if let Some(end) = expect_byte(text, over_end, b'>') {
                        let tag = UnitTag {
                            span: pos..end,
                            letter,
                            value,
                            unit,
                            override_unit: Some(&text[over_start..over_end]),
                        };
                        return Some((tag, end));
                    }
                }
            }
            if let Some(end) = expect_byte(text, unit_end, b'>') {
                let tag = UnitTag { span: pos..end, letter, value, unit, override_unit: None };
                return Some((tag, end));
            }
        }
        None
    }

    fn presend_tag_at<'t>(&self, text: &'t str, pos: usize, escaped: bool) -> Option<(PresendTag<'t>, usize)> {
        let mut i = expect_open(text, pos, escaped)?;
        i = expect_byte(text, i, b':')?;

        let value_end = scan_value(text, i)?;
        let value = &text[i..value_end];
        let unit_start = skip_spaces(text, value_end);

        for unit_end in self.unit_ends(text, unit_start) {
            let Some(targets_start) = expect_byte(text, unit_end, b':') else {
                continue;
            };
            if let Some(targets_end) = self.target_list_end(text, targets_start) {
                let tag = PresendTag {
                    span: pos..targets_end + 1,
                    value,
                    unit: &text[unit_start..unit_end],
                    targets: &text[targets_start..targets_end],
                };
                return Some((tag, targets_end + 1));
            }
        }
        None
    }

    /// End of a `unit(,\s*unit)*` list that is followed by `>`.
    ///
    /// Unit names never contain `>`, so the list can only end at the first
    /// one. The walk visits each candidate unit start once, in order.
    fn target_list_end(&self, text: &str, pos: usize) -> Option<usize> {
        let close = pos + text[pos..].find('>')?;
        let mut pending = BTreeSet::from([pos]);
        while let Some(start) = pending.pop_first() {
            for end in self.unit_ends(text, start) {
                if end == close {
                    return Some(close);
                }
                if end > close {
                    continue;
                }
                if let Some(next) = expect_byte(text, end, b',') {
                    pending.insert(skip_spaces(text, next));
                }
            }
        }
        None
    }

    fn natural_at<'t>(&self, text: &'t str, pos: usize) -> Option<(NaturalMention<'t>, usize)> {
        // no fractions or paths, and never start halfway through a number
        if preceded_by(text, pos, |c| c == '/' || c.is_ascii_digit() || c == '.' || c == ',') {
            return None;
        }
        let value_end = scan_value(text, pos)?;
        let unit_start = skip_spaces(text, value_end);

        self.unit_ends(text, unit_start)
            .into_iter()
            .find(|&end| !splits_word(text, end))
            .map(|end| {
                let mention = NaturalMention {
                    span: pos..end,
                    value: &text[pos..value_end],
                    unit: &text[unit_start..end],
                };
                (mention, end)
            })
    }

    /// End offsets of every unit name starting at `pos`, longest first
    fn unit_ends(&self, text: &str, pos: usize) -> Vec<usize> {
        self.unit_names()
            .iter()
            .filter(|name| {
                text.get(pos..pos + name.len())
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name))
            })
            .map(|name| pos + name.len())
            .collect()
    }
}

/// Parse a numeric literal from tag or mention syntax.
///
/// The first comma is the decimal separator. After normalising it, the
/// longest prefix shaped like `-digits.digits` is parsed, so `12,423` is
/// 12.423 and `1.234,5` is 1.234. Returns `None` when no digit is present
/// or the value does not fit in an f64.
pub fn parse_value(literal: &str) -> Option<f64> {
    let normalized = literal.replacen(',', ".", 1);
    let bytes = normalized.as_bytes();

    let mut i = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = &normalized[int_start..i];

    let mut frac_digits = "";
    if bytes.get(i) == Some(&b'.') {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_digits = &normalized[frac_start..j];
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let canonical = format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        if int_digits.is_empty() { "0" } else { int_digits },
        if frac_digits.is_empty() { "0" } else { frac_digits },
    );
    canonical.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Quick check for anything that looks like tag syntax (`<uX:`, `<!uX:`, `<u:`, `<!u:`)
pub fn has_tag_syntax(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<!?u[TDLWV]?:").unwrap())
        .is_match(text)
}

/// Spans of every `<u...>` region, well-formed or not
pub fn unit_regions(text: &str) -> Vec<Range<usize>> {
    unit_region_regex().find_iter(text).map(|m| m.range()).collect()
}

/// Prefix every emoji inside a `<u...>` region with a backslash
pub fn defuse_emoji(text: &str) -> String {
    unit_region_regex()
        .replace_all(text, |caps: &regex::Captures| {
            emoji_regex().replace_all(&caps[0], "\\$0").into_owned()
        })
        .into_owned()
}

pub fn is_emoji(c: char) -> bool {
    matches!(c, '\u{1F000}'..='\u{1F9FF}' | '\u{2600}'..='\u{27BF}')
}

fn unit_region_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<u[^>]*>").unwrap())
}

fn emoji_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x{1F000}-\x{1F9FF}\x{2600}-\x{27BF}]").unwrap())
}

/// Left-to-right, non-overlapping scan. `first` filters candidate start
/// bytes (always ASCII, so every candidate is a char boundary).
fn scan<T>(
    text: &str,
    first: impl Fn(u8) -> bool,
    mut try_at: impl FnMut(usize) -> Option<(T, usize)>,
) -> Vec<T> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if first(bytes[pos]) {
            if let Some((item, end)) = try_at(pos) {
                found.push(item);
                pos = end;
                continue;
            }
        }
        pos += 1;
    }
    found
}

fn is_value_start(b: u8) -> bool {
    b == b'-' || b == b'.' || b == b',' || b.is_ascii_digit()
}

/// `-?[0-9.,]+` starting at `pos`
fn scan_value(text: &str, pos: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = pos;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    let body_start = i;
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.' || bytes[i] == b',') {
        i += 1;
    }
    (i > body_start).then_some(i)
}

/// `<u` or `<!u`, returning the offset after it
fn expect_open(text: &str, pos: usize, escaped: bool) -> Option<usize> {
    let mut i = expect_byte(text, pos, b'<')?;
    if escaped {
        i = expect_byte(text, i, b'!')?;
    }
    match text.as_bytes().get(i) {
        Some(b'u') | Some(b'U') => Some(i + 1),
        _ => None,
    }
}

fn expect_byte(text: &str, pos: usize, expected: u8) -> Option<usize> {
    (text.as_bytes().get(pos) == Some(&expected)).then_some(pos + 1)
}

fn skip_spaces(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(text.len(), |(i, _)| pos + i)
}

fn preceded_by(text: &str, pos: usize, pred: impl Fn(char) -> bool) -> bool {
    text[..pos].chars().next_back().is_some_and(pred)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `pos` falls between two word characters
fn splits_word(text: &str, pos: usize) -> bool {
    text[..pos].chars().next_back().is_some_and(is_word_char)
        && text[pos..].chars().next().is_some_and(is_word_char)
}
