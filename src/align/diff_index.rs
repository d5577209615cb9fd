//! Position-sorted difference list with the gap tables used for coordinate
//! mapping between reference and query space.

use super::difference::{Difference, FILLER};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffIndex {
    diffs: Vec<Difference>,
    // Read deletions (base2 is a gap)
    query_gaps_query: Vec<usize>,
    query_gaps_reference: Vec<usize>,
    // Read insertions (base1 is a gap)
    reference_gaps_query: Vec<usize>,
    reference_gaps_reference: Vec<usize>,
}

fn count_at_or_below(table: &[usize], position: usize) -> usize {
    table.partition_point(|&p| p <= position)
}

impl DiffIndex {
    /// Sorts the differences into canonical order and builds the gap tables.
    pub fn new(mut diffs: Vec<Difference>) -> Self {
        diffs.sort_by_key(Difference::sort_key);
        let mut index = DiffIndex {
            diffs,
            ..Default::default()
        };

        for diff in &index.diffs {
            debug_assert!(
                !(diff.is_reference_gap() && diff.is_query_gap()),
                "Gap aligned to gap: {}",
                diff
            );
            if diff.is_reference_gap() {
                index.reference_gaps_query.push(diff.position2);
                index.reference_gaps_reference.push(diff.position1);
            } else if diff.is_query_gap() {
                index.query_gaps_query.push(diff.position2);
                index.query_gaps_reference.push(diff.position1);
            }
        }

        // Lookups binary-search these tables
        for table in [
            &mut index.query_gaps_query,
            &mut index.query_gaps_reference,
            &mut index.reference_gaps_query,
            &mut index.reference_gaps_reference,
        ] {
            table.sort_unstable();
        }
        index
    }

    pub fn diffs(&self) -> &[Difference] {
        &self.diffs
    }

    pub fn into_diffs(self) -> Vec<Difference> {
        self.diffs
    }

    pub fn len(&self) -> usize {
        self.diffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn query_gap_count(&self) -> usize {
        self.query_gaps_query.len()
    }

    pub fn reference_gap_count(&self) -> usize {
        self.reference_gaps_query.len()
    }

    /// Query length implied by a reference span of `reference_len` bases.
    pub fn query_length(&self, reference_len: usize) -> usize {
        reference_len + self.reference_gap_count() - self.query_gap_count()
    }

    pub fn reference_pos(&self, query_pos: usize, reference_start: usize, query_start: usize) -> usize {
        let pos = query_pos as i64 + reference_start as i64 - query_start as i64
            + count_at_or_below(&self.query_gaps_query, query_pos) as i64
            - count_at_or_below(&self.reference_gaps_query, query_pos) as i64;
        assert!(pos >= 1, "Query position {} maps before the reference", query_pos);
        pos as usize
    }

    pub fn pos_from_reference(
        &self,
        reference_pos: usize,
        reference_start: usize,
        query_start: usize,
    ) -> usize {
        let pos = reference_pos as i64 - reference_start as i64 + query_start as i64
            - count_at_or_below(&self.query_gaps_reference, reference_pos) as i64
            + count_at_or_below(&self.reference_gaps_reference, reference_pos) as i64;
        assert!(
            pos >= 1,
            "Reference position {} maps before the query start",
            reference_pos
        );
        pos as usize
    }

    /// The difference describing reference column `reference_pos`, never an
    /// insertion placed before it.
    pub fn at_reference_position(&self, reference_pos: usize) -> Option<&Difference> {
        self.diffs
            .binary_search_by(|d| (d.position1, !d.is_reference_gap()).cmp(&(reference_pos, true)))
            .ok()
            .map(|i| &self.diffs[i])
    }

    pub(crate) fn index_at_reference_position(&self, reference_pos: usize) -> Option<usize> {
        self.diffs
            .binary_search_by(|d| (d.position1, !d.is_reference_gap()).cmp(&(reference_pos, true)))
            .ok()
    }

    /// Inserted bases placed immediately before `reference_pos`, in query order.
    pub fn insertions_before(&self, reference_pos: usize) -> &[Difference] {
        let lo = self
            .diffs
            .partition_point(|d| d.position1 < reference_pos);
        let hi = lo
            + self.diffs[lo..]
                .iter()
                .take_while(|d| d.position1 == reference_pos && d.is_reference_gap())
                .count();
        &self.diffs[lo..hi]
    }

    /// The difference describing query base `query_pos`, never a deletion.
    pub fn at_query_position(&self, query_pos: usize) -> Option<&Difference> {
        let start = self.diffs.partition_point(|d| d.position2 < query_pos);
        self.diffs[start..]
            .iter()
            .take_while(|d| d.position2 == query_pos)
            .find(|d| !d.is_query_gap())
    }

    /// Number of differences with `start <= position1 <= end`, skipping calls
    /// that read as filler under the quality threshold.
    pub fn count_in_range(&self, start: usize, end: usize, quality_threshold: u8) -> usize {
        if start > end {
            return 0;
        }

        // Halve until some difference lands inside the range
        let (mut lo, mut hi) = (0, self.diffs.len());
        let hit = loop {
            if lo >= hi {
                return 0;
            }
            let mid = lo + (hi - lo) / 2;
            let pos = self.diffs[mid].position1;
            if pos < start {
                lo = mid + 1;
            } else if pos > end {
                hi = mid;
            } else {
                break mid;
            }
        };

        let counted = |d: &&Difference| d.effective_base2(quality_threshold) != FILLER;
        let below = self.diffs[..hit]
            .iter()
            .rev()
            .take_while(|d| d.position1 >= start)
            .filter(counted)
            .count();
        let above = self.diffs[hit..]
            .iter()
            .take_while(|d| d.position1 <= end)
            .filter(counted)
            .count();
        below + above
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::difference::GAP;

    // Reference 101..110 against query 1..9:
    //   q1-q4 match r101-r104, q5 is an inserted T, q6 is G over reference A at
    //   r105, q7 matches r106, r107-r108 are deleted, q8-q9 match r109-r110.
    fn example_index() -> DiffIndex {
        DiffIndex::new(vec![
            Difference::new(108, b'G', 8, GAP),
            Difference::new(105, b'A', 6, b'G'),
            Difference::new(107, b'C', 8, GAP),
            Difference::new(105, GAP, 5, b'T'),
        ])
    }

    #[test]
    fn diffs_are_sorted_on_construction() {
        let index = example_index();
        let positions: Vec<(usize, usize)> = index
            .diffs()
            .iter()
            .map(|d| (d.position1, d.position2))
            .collect();
        assert_eq!(positions, vec![(105, 5), (105, 6), (107, 8), (108, 8)]);
    }

    #[test]
    fn gap_counts_and_query_length() {
        let index = example_index();
        assert_eq!(index.query_gap_count(), 2);
        assert_eq!(index.reference_gap_count(), 1);
        assert_eq!(index.query_length(10), 9);
    }

    #[test]
    fn maps_query_to_reference() {
        let index = example_index();
        let mapped: Vec<usize> = (1..=9).map(|q| index.reference_pos(q, 101, 1)).collect();
        assert_eq!(mapped, vec![101, 102, 103, 104, 104, 105, 106, 109, 110]);
    }

    #[test]
    fn maps_reference_to_query() {
        let index = example_index();
        let mapped: Vec<usize> = (101..=110)
            .map(|r| index.pos_from_reference(r, 101, 1))
            .collect();
        assert_eq!(mapped, vec![1, 2, 3, 4, 6, 7, 7, 7, 8, 9]);
    }

    #[test]
    fn round_trip_skips_inserted_bases() {
        let index = example_index();
        for q in (1..=9).filter(|&q| q != 5) {
            let r = index.reference_pos(q, 101, 1);
            assert_eq!(index.pos_from_reference(r, 101, 1), q);
        }
    }

    #[test]
    fn round_trip_with_offset_query_start() {
        let index = DiffIndex::new(vec![
            Difference::new(12, b'A', 5, GAP),
            Difference::new(20, GAP, 12, b'C'),
        ]);
        for q in (3..=25).filter(|&q| q != 12) {
            let r = index.reference_pos(q, 10, 3);
            assert_eq!(index.pos_from_reference(r, 10, 3), q);
        }
    }

    #[test]
    fn reference_mapping_is_monotonic() {
        let index = example_index();
        let mapped: Vec<usize> = (1..=9)
            .filter(|&q| index.at_query_position(q).map_or(true, |d| !d.is_reference_gap()))
            .map(|q| index.reference_pos(q, 101, 1))
            .collect();
        assert!(mapped.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reference_lookup_skips_insertions() {
        let index = example_index();
        assert_eq!(index.at_reference_position(105).unwrap().base2, b'G');
        assert!(index.at_reference_position(107).unwrap().is_query_gap());
        assert!(index.at_reference_position(104).is_none());
        assert!(index.at_reference_position(111).is_none());
    }

    #[test]
    fn query_lookup_skips_deletions() {
        let index = example_index();
        assert_eq!(index.at_query_position(5).unwrap().base2, b'T');
        assert_eq!(index.at_query_position(6).unwrap().base2, b'G');
        assert!(index.at_query_position(8).is_none());
    }

    #[test]
    fn insertions_before_position() {
        let index = DiffIndex::new(vec![
            Difference::new(7, GAP, 8, b'C'),
            Difference::new(7, b'A', 9, b'T'),
            Difference::new(7, GAP, 7, b'G'),
        ]);
        let inserted: Vec<u8> = index.insertions_before(7).iter().map(|d| d.base2).collect();
        assert_eq!(inserted, b"GC".to_vec());
        assert!(index.insertions_before(8).is_empty());
    }

    #[test]
    fn empty_index_has_no_matches() {
        let index = DiffIndex::default();
        assert!(index.at_reference_position(1).is_none());
        assert!(index.at_query_position(1).is_none());
        assert_eq!(index.count_in_range(1, 100, 0), 0);
        assert_eq!(index.reference_pos(5, 10, 1), 14);
    }

    #[test]
    fn counts_differences_in_range() {
        let index = DiffIndex::new(
            [10, 20, 20, 30, 40, 50]
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    if i == 2 {
                        Difference::new(p, GAP, p - 1, b'A')
                    } else {
                        Difference::new(p, b'C', p, b'T')
                    }
                })
                .collect(),
        );
        assert_eq!(index.count_in_range(1, 100, 0), 6);
        assert_eq!(index.count_in_range(20, 40, 0), 4);
        assert_eq!(index.count_in_range(21, 29, 0), 0);
        assert_eq!(index.count_in_range(50, 50, 0), 1);
        assert_eq!(index.count_in_range(40, 20, 0), 0);
    }

    #[test]
    fn count_excludes_low_quality_calls() {
        let index = DiffIndex::new(vec![
            Difference::with_quality(10, b'A', 10, b'C', 5),
            Difference::with_quality(11, b'A', 11, b'C', 40),
            Difference::new(12, b'A', 12, b'C'),
        ]);
        assert_eq!(index.count_in_range(1, 20, 0), 3);
        assert_eq!(index.count_in_range(1, 20, 10), 2);
        assert_eq!(index.count_in_range(1, 20, 50), 1);
    }
}
