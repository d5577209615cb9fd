//! Merging two mate alignments into one clone-relative alignment.

use super::alignment::{Alignment, AlignmentSource};
use super::difference::Difference;
use super::segment::Segment;
use std::cmp::Ordering;

/// Reference span covering both mates and whatever lies between them.
pub fn mate_pair_span(first: Segment, second: Segment) -> Segment {
    Segment::on_reference(first.start.min(second.start), first.end.max(second.end))
}

/// The unsequenced stretch between two non-overlapping mates, if any.
pub fn mate_gap(first: Segment, second: Segment) -> Option<Segment> {
    let (left, right) = if second.start < first.start {
        (second, first)
    } else {
        (first, second)
    };
    if right.start > left.end + 1 {
        Some(Segment::on_reference(left.end + 1, right.start - 1))
    } else {
        None
    }
}

/// Merges the differences of two mates ordered by reference position, with
/// query positions rewritten relative to a clone query starting at 1.
///
/// The mate starting further left contributes the first query bases; the
/// bases between the mates are counted as if the reference had been read.
/// Two differences describing the same reference column keep the one from
/// `mate1`.
pub fn merge_mate_diffs<S: AlignmentSource + ?Sized>(
    mate1: &Alignment,
    mate2: &Alignment,
    src: &S,
) -> Vec<Difference> {
    let mate1_is_left = mate1.reference_segment().start <= mate2.reference_segment().start;
    let (left, right) = if mate1_is_left {
        (mate1, mate2)
    } else {
        (mate2, mate1)
    };

    let left_query = left.query_segment(src);
    let right_query = right.query_segment(src);
    let gap = right.reference_segment().start as i64 - left.reference_segment().end as i64 - 1;
    let right_offset = left_query.len() as i64 + gap + 1 - right_query.start as i64;

    let remap_left = |d: &Difference| Difference {
        position2: d.position2 + 1 - left_query.start,
        ..*d
    };
    let remap_right = |d: &Difference| {
        let position2 = d.position2 as i64 + right_offset;
        assert!(position2 >= 1, "Mate difference {} maps before the clone start", d);
        Difference {
            position2: position2 as usize,
            ..*d
        }
    };

    let left_diffs = left.diffs(src);
    let right_diffs = right.diffs(src);
    let mut merged = Vec::with_capacity(left_diffs.len() + right_diffs.len());
    let (mut i, mut j) = (0, 0);

    while i < left_diffs.len() && j < right_diffs.len() {
        let (l, r) = (&left_diffs[i], &right_diffs[j]);
        let column = |d: &Difference| (d.position1, !d.is_reference_gap());
        match column(l).cmp(&column(r)) {
            Ordering::Less => {
                merged.push(remap_left(l));
                i += 1;
            }
            Ordering::Greater => {
                merged.push(remap_right(r));
                j += 1;
            }
            Ordering::Equal => {
                merged.push(if mate1_is_left {
                    remap_left(l)
                } else {
                    remap_right(r)
                });
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend(left_diffs[i..].iter().map(remap_left));
    merged.extend(right_diffs[j..].iter().map(remap_right));

    log::trace!(
        "Merged {} + {} mate differences into {}",
        left_diffs.len(),
        right_diffs.len(),
        merged.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::alignment::tests::FixedSource;
    use crate::align::alignment::AlignmentKind;
    use crate::align::difference::GAP;
    use crate::align::segment::{CloneId, ReadId, SequenceRef};

    fn mate(id: usize, start: usize, end: usize, diffs: Vec<Difference>) -> Alignment {
        Alignment::new(
            AlignmentKind::Simple(ReadId(id)),
            Segment::on_reference(start, end),
            None,
            id == 0,
            Some(diffs),
        )
    }

    fn substitution(position: usize, query_pos: usize) -> Difference {
        Difference::new(position, b'A', query_pos, b'C')
    }

    #[test]
    fn merges_non_overlapping_mates_in_order() {
        let src = FixedSource::new(&[b'A'; 60]);
        let mate1 = mate(0, 1, 25, vec![substitution(10, 10), substitution(20, 20)]);
        let mate2 = mate(1, 26, 50, vec![substitution(30, 5), substitution(40, 15)]);

        let merged = merge_mate_diffs(&mate1, &mate2, &src);
        let positions: Vec<(usize, usize)> =
            merged.iter().map(|d| (d.position1, d.position2)).collect();
        assert_eq!(positions, vec![(10, 10), (20, 20), (30, 30), (40, 40)]);

        // Argument order does not matter
        assert_eq!(merge_mate_diffs(&mate2, &mate1, &src), merged);
    }

    #[test]
    fn gap_between_mates_counts_as_query_bases() {
        let src = FixedSource::new(&[b'A'; 60]);
        let mate1 = mate(0, 11, 20, vec![substitution(15, 5)]);
        let mate2 = mate(1, 31, 40, vec![substitution(35, 5)]);
        let merged = merge_mate_diffs(&mate1, &mate2, &src);
        assert_eq!(merged[0].position2, 5);
        assert_eq!(merged[1].position2, 25);

        assert_eq!(
            mate_gap(mate1.reference_segment(), mate2.reference_segment()),
            Some(Segment::on_reference(21, 30))
        );
        assert_eq!(
            mate_pair_span(mate2.reference_segment(), mate1.reference_segment()),
            Segment::on_reference(11, 40)
        );
    }

    #[test]
    fn mate_indels_shift_the_second_mate() {
        let src = FixedSource::new(&[b'A'; 60]);
        // Left mate has an extra inserted base, so its query is 11 long
        let mate1 = mate(0, 1, 10, vec![Difference::new(5, GAP, 5, b'T')]);
        let mate2 = mate(1, 11, 20, vec![Difference::new(12, b'A', 2, GAP)]);
        let merged = merge_mate_diffs(&mate1, &mate2, &src);
        assert_eq!(merged[0].position2, 5);
        assert_eq!(merged[1].position2, 13);
    }

    #[test]
    fn overlapping_column_prefers_first_mate() {
        let src = FixedSource::new(&[b'A'; 60]);
        let mate1 = mate(0, 21, 40, vec![Difference::new(25, b'A', 5, b'G')]);
        let mate2 = mate(1, 11, 30, vec![Difference::new(25, b'A', 15, b'T')]);
        let merged = merge_mate_diffs(&mate1, &mate2, &src);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].base2, b'G');
        assert_eq!(mate_gap(mate1.reference_segment(), mate2.reference_segment()), None);
    }

    #[test]
    fn insertion_and_column_at_same_position_are_both_kept() {
        let src = FixedSource::new(&[b'A'; 60]);
        let mate1 = mate(0, 1, 20, vec![Difference::new(15, GAP, 15, b'T')]);
        let mate2 = mate(1, 10, 30, vec![Difference::new(15, b'A', 6, b'C')]);
        let merged = merge_mate_diffs(&mate1, &mate2, &src);
        assert_eq!(merged.len(), 2);
        assert!(merged[0].is_reference_gap());
        assert!(!merged[1].is_reference_gap());
    }

    #[test]
    fn clone_alignment_spans_both_mates() {
        let src = FixedSource::new(&[b'A'; 60]);
        let mate1 = mate(0, 1, 25, vec![substitution(10, 10)]);
        let mate2 = mate(1, 26, 50, vec![substitution(30, 5)]);
        let span = mate_pair_span(mate1.reference_segment(), mate2.reference_segment());
        let sequence = SequenceRef::Clone(CloneId(0));
        let clone = Alignment::new(
            AlignmentKind::PairedMerge {
                pair: CloneId(0),
                mates: [ReadId(0), ReadId(1)],
            },
            span,
            Some(Segment::new(sequence, 1, 0)),
            true,
            Some(merge_mate_diffs(&mate1, &mate2, &src)),
        );
        let query = clone.query_segment(&src);
        assert_eq!((query.start, query.end), (1, 50));
        assert_eq!(clone.base(30, &src), b'C');
        assert_eq!(clone.base(31, &src), b'A');
    }
}
