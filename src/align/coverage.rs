//! Online union of read spans that keeps track of the holes left inside the
//! covered range.

use super::segment::{Segment, SequenceRef};

/// Running covered range plus the ordered, disjoint holes inside it.
///
/// Spans may arrive in any order; the final state depends only on the set of
/// spans added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageTracker {
    range: Option<(usize, usize)>,
    holes: Vec<(usize, usize)>,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<(usize, usize)> {
        self.range
    }

    pub fn holes(&self) -> &[(usize, usize)] {
        &self.holes
    }

    /// Adds the inclusive span `[start, end]`.
    pub fn update_connected(&mut self, start: usize, end: usize) {
        assert!(start <= end, "Empty span {}-{}", start, end);
        let (range_start, range_end) = match self.range {
            None => {
                self.range = Some((start, end));
                return;
            }
            Some(range) => range,
        };

        if end + 1 < range_start {
            // Entirely left of the range with a gap between
            self.holes.insert(0, (end + 1, range_start - 1));
            self.range = Some((start, range_end));
        } else if start > range_end + 1 {
            // Entirely right of the range with a gap between
            self.holes.push((range_end + 1, start - 1));
            self.range = Some((range_start, end));
        } else if start < range_start {
            // Reaches past the left edge; clears holes it runs over
            self.cover(start, end);
            self.range = Some((start, range_end.max(end)));
        } else if end > range_end {
            // Reaches past the right edge
            self.cover(start, end);
            self.range = Some((range_start, end));
        } else {
            // Interior: may split, shrink or remove holes
            self.cover(start, end);
        }
    }

    /// Removes `[start, end]` from every hole it touches.
    fn cover(&mut self, start: usize, end: usize) {
        let first = self.holes.partition_point(|&(_, hole_end)| hole_end < start);
        let last = self.holes.partition_point(|&(hole_start, _)| hole_start <= end);
        if first >= last {
            return;
        }

        let mut remainder = Vec::with_capacity(2);
        let (head_start, _) = self.holes[first];
        let (_, tail_end) = self.holes[last - 1];
        if head_start < start {
            remainder.push((head_start, start - 1));
        }
        if tail_end > end {
            remainder.push((end + 1, tail_end));
        }
        self.holes.splice(first..last, remainder);
    }

    pub fn into_segments(self, sequence: SequenceRef) -> Vec<Segment> {
        self.holes
            .into_iter()
            .map(|(start, end)| Segment::new(sequence, start, end))
            .collect()
    }
}

/// Reference regions inside the union of `spans` that no span covers.
pub fn find_unknown_regions<I>(spans: I) -> Vec<Segment>
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut tracker = CoverageTracker::new();
    for (start, end) in spans {
        tracker.update_connected(start, end);
    }
    tracker.into_segments(SequenceRef::Reference)
}
