//! One column where an aligned sequence departs from the reference.

use std::fmt;

/// Gap symbol used on either side of a difference.
pub const GAP: u8 = b'-';
/// Base reported for low-confidence or uncovered calls.
pub const FILLER: u8 = b'n';

/// A single disagreement between an aligned sequence and the reference.
///
/// `position1`/`base1` describe the reference side and `position2`/`base2` the
/// aligned sequence. A read insertion has `base1 == GAP` and sits before
/// reference position `position1`; a read deletion has `base2 == GAP` and
/// `position2` is the query position of the base following the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Difference {
    pub position1: usize,
    pub base1: u8,
    pub position2: usize,
    pub base2: u8,
    /// Phred quality of `base2`, if the call is quality-qualified.
    pub quality: Option<u8>,
}

impl Difference {
    pub fn new(position1: usize, base1: u8, position2: usize, base2: u8) -> Self {
        Difference {
            position1,
            base1,
            position2,
            base2,
            quality: None,
        }
    }

    pub fn with_quality(
        position1: usize,
        base1: u8,
        position2: usize,
        base2: u8,
        quality: u8,
    ) -> Self {
        Difference {
            quality: Some(quality),
            ..Self::new(position1, base1, position2, base2)
        }
    }

    /// True when the reference side is a gap (the sequence has an insertion).
    pub fn is_reference_gap(&self) -> bool {
        self.base1 == GAP
    }

    /// True when the query side is a gap (the sequence has a deletion).
    pub fn is_query_gap(&self) -> bool {
        self.base2 == GAP
    }

    /// `base2` as seen under the given quality threshold.
    pub fn effective_base2(&self, quality_threshold: u8) -> u8 {
        match self.quality {
            Some(quality) if quality < quality_threshold => FILLER,
            _ => self.base2,
        }
    }

    /// Canonical ordering: by reference position, insertions before the
    /// difference describing the reference base itself, then query position.
    pub(crate) fn sort_key(&self) -> (usize, bool, usize) {
        (self.position1, !self.is_reference_gap(), self.position2)
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}>{}:{}",
            self.position1, self.base1 as char, self.position2, self.base2 as char
        )
    }
}
