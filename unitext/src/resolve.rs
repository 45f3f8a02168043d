//! Match resolution - explicit tags win, natural mentions fill the gaps

use std::fmt;
use std::ops::Range;
use crate::scanner::Match;

/// Region of text that natural mentions may not sit inside
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusionRange {
    pub start: usize,
    pub end: usize,
}

impl ExclusionRange {
    pub fn covers(&self, span: &Range<usize>) -> bool {
        span.start >= self.start && span.end <= self.end
    }
}

impl From<Range<usize>> for ExclusionRange {
    fn from(range: Range<usize>) -> Self {
        ExclusionRange { start: range.start, end: range.end }
    }
}

/// Why a natural candidate was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Fully inside a tag or a `<u...>` region
    Excluded(ExclusionRange),
    /// Shares text with an accepted match
    Overlaps(Range<usize>),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Excluded(r) => write!(f, "inside excluded range {}..{}", r.start, r.end),
            Rejection::Overlaps(r) => write!(f, "overlaps match at {}..{}", r.start, r.end),
        }
    }
}

/// Accumulates accepted matches for one text unit
#[derive(Debug, Default)]
pub struct Resolver {
    accepted: Vec<Match>,
    exclusions: Vec<ExclusionRange>,
}

impl Resolver {
    /// Start from the explicit matches; each also becomes an exclusion
    pub fn new(explicit: Vec<Match>) -> Self {
        let exclusions = explicit.iter().map(|m| ExclusionRange::from(m.span.clone())).collect();
        Resolver { accepted: explicit, exclusions }
    }

    pub fn exclude(&mut self, range: impl Into<ExclusionRange>) {
        self.exclusions.push(range.into());
    }

    pub fn exclusions(&self) -> &[ExclusionRange] {
        &self.exclusions
    }

    /// Check a natural candidate against exclusions and accepted matches
    pub fn check(&self, span: &Range<usize>) -> Result<(), Rejection> {
        if let Some(range) = self.exclusions.iter().find(|r| r.covers(span)) {
            return Err(Rejection::Excluded(*range));
        }
        if let Some(m) = self.accepted.iter().find(|m| m.overlaps(span)) {
            return Err(Rejection::Overlaps(m.span.clone()));
        }
        Ok(())
    }

    /// Accept a natural candidate if it passes [`Resolver::check`]
    pub fn offer(&mut self, candidate: Match) -> Result<(), Rejection> {
        self.check(&candidate.span)?;
        self.accepted.push(candidate);
        Ok(())
    }

    /// Accepted matches ordered by start offset
    pub fn into_sorted(self) -> Vec<Match> {
        let mut matches = self.accepted;
        matches.sort_by_key(|m| m.span.start);
        matches
    }
}
