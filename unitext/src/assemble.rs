//! Segment assembly - turns matches over shielded text into output segments

use tracing::warn;
use unitext_core::{
    convert_unit, ConversionError, ConversionResult, FormatOptions, Preferences, QuantityType, Unit,
};
use crate::cache::{CacheKey, ConversionCache};
use crate::scanner::{Match, MatchSource};
use crate::segment::{Annotation, Caption, Segment};
use crate::shield::Shielded;

/// Builds annotations for one text unit against a preferences snapshot
pub struct Annotator<'a, C: ConversionCache + ?Sized> {
    cache: &'a mut C,
    prefs: &'a Preferences,
    options: FormatOptions,
}

impl<'a, C: ConversionCache + ?Sized> Annotator<'a, C> {
    pub fn new(cache: &'a mut C, prefs: &'a Preferences) -> Self {
        Annotator {
            cache,
            prefs,
            options: prefs.format_options(),
        }
    }

    /// Convert and format, consulting the cache first
    pub fn convert(
        &mut self,
        quantity: QuantityType,
        value: f64,
        from: Unit,
        to: Unit,
    ) -> Result<ConversionResult, ConversionError> {
        let key = CacheKey::new(quantity, value, from, to, self.options);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let result = convert_unit(quantity, value, from, to, &self.options)?;
        self.cache.put(key, result.clone());
        Ok(result)
    }

    pub fn annotate(&mut self, m: &Match) -> Result<Annotation, ConversionError> {
        let preferred = self.prefs.preferred_unit(m.quantity);
        let display_unit = m.override_unit.unwrap_or(preferred);
        let shown = self.convert(m.quantity, m.value, m.unit, display_unit)?;

        let caption = match m.override_unit {
            Some(over) if over != preferred => {
                let in_preferred = self.convert(m.quantity, m.value, m.unit, preferred)?;
                Caption::with_override(shown.original, in_preferred.converted)
            }
            _ => Caption::original(shown.original),
        };

        Ok(Annotation {
            display: shown.converted,
            caption,
            quantity: m.quantity,
            unit: m.unit,
            display_unit,
            explicit: m.source == MatchSource::Explicit,
            offset: m.span.start,
        })
    }
}

/// Interleave restored literal text with annotations.
///
/// `matches` must be sorted and non-overlapping. A match that fails to
/// convert is emitted as its literal text.
pub fn assemble<C: ConversionCache + ?Sized>(
    text: &str,
    matches: &[Match],
    shield: &Shielded,
    annotator: &mut Annotator<'_, C>,
) -> Vec<Segment> {
    if matches.is_empty() {
        return vec![Segment::text(shield.restore(text))];
    }

    let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;
    for m in matches {
        if m.span.start > cursor {
            push_text(&mut segments, shield.restore(&text[cursor..m.span.start]));
        }
        match annotator.annotate(m) {
            Ok(annotation) => segments.push(Segment::Annotation(annotation)),
            Err(e) => {
                warn!(error = %e, "conversion failed, keeping literal text");
                push_text(&mut segments, shield.restore(&text[m.span.clone()]));
            }
        }
        cursor = m.span.end;
    }
    if cursor < text.len() {
        push_text(&mut segments, shield.restore(&text[cursor..]));
    }
    segments
}

/// Append literal text, merging with a preceding text segment
fn push_text(segments: &mut Vec<Segment>, fragment: String) {
    if fragment.is_empty() {
        return;
    }
    if let Some(Segment::Text { text }) = segments.last_mut() {
        text.push_str(&fragment);
    } else {
        segments.push(Segment::Text { text: fragment });
    }
}
