//! Output segments
//!
//! A processed text unit is a flat list of literal text and annotations.
//! Hosts that render structured messages pass elements and code spans
//! through as segments too; elements are descended into, code is not.

use std::fmt;
use serde::{Serialize, Deserialize};
use unitext_core::{QuantityType, Unit};
use crate::scanner::MatchSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Segment {
    /// Literal text
    Text { text: String },
    /// A converted measurement
    Annotation(Annotation),
    /// Inline or block code, never scanned
    Code { text: String },
    /// Host element whose children are processed in place
    Element {
        tag: String,
        #[serde(default)]
        children: Vec<Segment>,
    },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn code(text: impl Into<String>) -> Self {
        Segment::Code { text: text.into() }
    }

    pub fn element(tag: impl Into<String>, children: Vec<Segment>) -> Self {
        Segment::Element { tag: tag.into(), children }
    }

    pub fn as_annotation(&self) -> Option<&Annotation> {
        match self {
            Segment::Annotation(a) => Some(a),
            _ => None,
        }
    }

    /// Text a reader would see, with annotations shown as their display value
    pub fn plain_text(&self) -> String {
        match self {
            Segment::Text { text } | Segment::Code { text } => text.clone(),
            Segment::Annotation(a) => a.display.clone(),
            Segment::Element { children, .. } => children.iter().map(Segment::plain_text).collect(),
        }
    }
}

/// Replacement for a matched measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Converted value shown inline, e.g. `62,14mi`
    pub display: String,
    pub caption: Caption,
    pub quantity: QuantityType,
    pub unit: Unit,
    pub display_unit: Unit,
    pub explicit: bool,
    /// Byte offset of the match in its text unit, usable as a render key
    pub offset: usize,
}

impl Annotation {
    pub fn source(&self) -> MatchSource {
        if self.explicit {
            MatchSource::Explicit
        } else {
            MatchSource::Natural
        }
    }

    /// Hover text for hosts without rich tooltips
    pub fn title(&self) -> String {
        self.caption.fallback_title()
    }
}

/// Tooltip content for an annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    /// The value in its source unit, e.g. `100,00km`
    pub original: String,
    /// The value in the preferred unit, only when an override displaced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred: Option<String>,
}

impl Caption {
    pub fn original(original: impl Into<String>) -> Self {
        Caption { original: original.into(), preferred: None }
    }

    pub fn with_override(original: impl Into<String>, preferred: impl Into<String>) -> Self {
        Caption {
            original: original.into(),
            preferred: Some(preferred.into()),
        }
    }

    pub fn is_override(&self) -> bool {
        self.preferred.is_some()
    }

    /// Rendered tooltip lines
    pub fn lines(&self) -> Vec<String> {
        match &self.preferred {
            Some(preferred) => vec![
                "Override".to_string(),
                format!("Original: {}", self.original),
                format!("Preferred: {}", preferred),
            ],
            None => vec![format!("Original: {}", self.original)],
        }
    }

    pub fn fallback_title(&self) -> String {
        format!("Original: {}", self.original)
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}
