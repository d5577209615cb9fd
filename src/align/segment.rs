//! Closed intervals on the reference or on one of the aligned sequences.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloneId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrainId(pub usize);

/// The sequence a segment is measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceRef {
    Reference,
    Read(ReadId),
    Clone(CloneId),
    Strain(StrainId),
}

/// A 1-based, inclusive interval `[start, end]` on a sequence.
///
/// An empty segment has `start == end + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    pub sequence: SequenceRef,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn new(sequence: SequenceRef, start: usize, end: usize) -> Self {
        assert!(
            start <= end + 1,
            "Invalid segment on {:?}: start {} > end {} + 1",
            sequence,
            start,
            end
        );
        Segment {
            sequence,
            start,
            end,
        }
    }

    pub fn on_reference(start: usize, end: usize) -> Self {
        Self::new(SequenceRef::Reference, start, end)
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closed-interval overlap; segments that share only an endpoint intersect.
    pub fn intersects(&self, other: &Segment) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    pub fn contains_position(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn contains(&self, other: &Segment) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
