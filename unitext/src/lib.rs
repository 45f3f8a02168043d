//! unitext - measurement annotation for chat text
//!
//! Finds measurements in message text and replaces them with annotations
//! showing the value in the reader's preferred unit.
//!
//! ```text
//! "I ran 100km"     -> [Text "I ran ", Annotation "62,14mi" (Original: 100,00km)]
//! "<uT:25°C:K>"     -> [Annotation "298,15K"]
//! "<!uT:25°C>"      -> [Text "<uT:25°C>"]
//! "<u:14km:mi,m>"   -> "14km\u{200B} (8,7mi & 14000m)"   (before sending)
//! ```
//!
//! [`Engine::transform`] processes a host's node list; code nodes are passed
//! through and text already carrying the pre-send marker is never rescanned.

pub mod grammar;
pub mod shield;
pub mod cache;
pub mod scanner;
pub mod resolve;
pub mod segment;
pub mod assemble;
pub mod presend;

use std::panic::{self, AssertUnwindSafe};
use tracing::{error, trace};
use unitext_core::Preferences;

pub use unitext_core::{
    ConversionError, ConversionResult, FormatOptions, QuantityType, SettingsError, Unit, UNITS,
};
pub use cache::{CacheKey, CacheStats, ConversionCache, FifoCache, NoCache, DEFAULT_CAPACITY};
pub use grammar::{Grammar, GRAMMAR};
pub use presend::PROCESSED_MARKER;
pub use scanner::{Match, MatchSource};
pub use segment::{Annotation, Caption, Segment};

use assemble::{assemble, Annotator};
use scanner::Scanner;
use shield::Shielded;

/// Annotation pipeline with its conversion cache
pub struct Engine<C: ConversionCache = FifoCache> {
    grammar: &'static Grammar,
    cache: C,
}

impl Engine<FifoCache> {
    /// Engine with the default bounded cache
    pub fn new() -> Self {
        Self::with_cache(FifoCache::default())
    }
}

impl Default for Engine<FifoCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ConversionCache> Engine<C> {
    pub fn with_cache(cache: C) -> Self {
        Engine { grammar: &GRAMMAR, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn grammar(&self) -> &'static Grammar {
        self.grammar
    }

    /// Annotate a host's node list.
    ///
    /// Returns the input unchanged when nothing in it can match. A panic
    /// inside the pipeline is logged and also yields the input unchanged.
    pub fn transform(&mut self, nodes: Vec<Segment>, prefs: &Preferences) -> Vec<Segment> {
        if !self.might_match(&nodes, prefs) {
            trace!("quick check found nothing to annotate");
            return nodes;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.process_nodes(nodes.clone(), prefs)));
        match result {
            Ok(processed) => processed,
            Err(cause) => {
                let message = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%message, "annotation failed, returning content unchanged");
                nodes
            }
        }
    }

    /// Annotate one text unit
    pub fn annotate_text(&mut self, text: &str, prefs: &Preferences) -> Vec<Segment> {
        if text.contains(PROCESSED_MARKER) {
            return vec![Segment::text(text)];
        }

        let shield = Shielded::new(text, self.grammar);
        let matches = Scanner::new(self.grammar).scan(shield.text(), prefs.auto_detect);
        trace!(matches = matches.len(), shielded = shield.len(), "scanned text unit");

        let mut annotator = Annotator::new(&mut self.cache, prefs);
        assemble(shield.text(), &matches, &shield, &mut annotator)
    }

    /// Expand pre-send tags in an outgoing message
    pub fn presend(&self, text: &str, prefs: &Preferences) -> String {
        presend::expand(self.grammar, text, prefs)
    }

    /// Cheap conservative test: false only if a full scan would find nothing
    pub fn might_match(&self, nodes: &[Segment], prefs: &Preferences) -> bool {
        nodes.iter().any(|node| match node {
            Segment::Text { text } => {
                grammar::has_tag_syntax(text)
                    || (prefs.auto_detect && self.grammar.has_natural_mention(text))
            }
            Segment::Element { children, .. } => self.might_match(children, prefs),
            Segment::Code { .. } | Segment::Annotation(_) => false,
        })
    }

    fn process_nodes(&mut self, nodes: Vec<Segment>, prefs: &Preferences) -> Vec<Segment> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Segment::Text { text } => out.extend(self.annotate_text(&text, prefs)),
                Segment::Element { tag, children } => {
                    let children = self.process_nodes(children, prefs);
                    out.push(Segment::Element { tag, children });
                }
                passthrough @ (Segment::Code { .. } | Segment::Annotation(_)) => out.push(passthrough),
            }
        }
        out
    }
}
