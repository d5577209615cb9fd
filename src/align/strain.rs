//! Plurality-vote consensus over the reads of a strain.

use super::alignment::{Alignment, AlignmentSource};
use super::coverage::find_unknown_regions;
use super::difference::{Difference, GAP};
use super::error::StrainError;
use super::segment::Segment;
use arrayvec::ArrayVec;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Vote slots in tie-break order.
const VOTE_ORDER: [u8; 7] = [b'A', b'C', b'T', b'G', b'N', b'X', GAP];

fn vote_slot(base: u8) -> usize {
    match base.to_ascii_uppercase() {
        b'A' => 0,
        b'C' => 1,
        b'T' => 2,
        b'G' => 3,
        b'N' => 4,
        GAP => 6,
        _ => 5,
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Votes {
    counts: [usize; 7],
    total: usize,
}

impl Votes {
    fn add(&mut self, base: u8) {
        self.counts[vote_slot(base)] += 1;
        self.total += 1;
    }

    /// A base wins when its votes outnumber the reads matching the reference;
    /// among several such bases the first in vote order wins.
    fn winner(&self, position: usize, coverage: usize) -> Result<Option<u8>, StrainError> {
        if self.total > coverage {
            return Err(StrainError::InconsistentCoverage {
                position,
                coverage,
                votes: self.total,
            });
        }
        let others = coverage - self.total;
        Ok(self
            .counts
            .iter()
            .position(|&count| count > others)
            .map(|slot| VOTE_ORDER[slot]))
    }
}

#[derive(Debug, Default)]
struct PositionVotes {
    insertions: Votes,
    columns: Votes,
}

/// Number of reads whose span contains a position.
struct CoverageIndex {
    starts: Vec<usize>,
    ends: Vec<usize>,
}

impl CoverageIndex {
    fn new(spans: impl Iterator<Item = Segment>) -> Self {
        let (mut starts, mut ends): (Vec<usize>, Vec<usize>) =
            spans.map(|span| (span.start, span.end)).unzip();
        starts.sort_unstable();
        ends.sort_unstable();
        CoverageIndex { starts, ends }
    }

    fn at(&self, position: usize) -> usize {
        self.starts.partition_point(|&s| s <= position)
            - self.ends.partition_point(|&e| e < position)
    }
}

/// Reference span covering every read.
pub fn strain_span(reads: &[&Alignment]) -> Option<Segment> {
    let start = reads.iter().map(|a| a.reference_segment().start).min()?;
    let end = reads.iter().map(|a| a.reference_segment().end).max()?;
    Some(Segment::on_reference(start, end))
}

/// Holes in the union of the read spans.
pub fn strain_unknown_regions(reads: &[&Alignment]) -> Vec<Segment> {
    find_unknown_regions(reads.iter().map(|a| {
        let span = a.reference_segment();
        (span.start, span.end)
    }))
}

/// Derives the consensus differences of `reads` relative to a strain whose
/// reference span starts at `span_start` and whose query starts at 1.
///
/// Each read casts at most one insertion vote and one column vote per
/// reference position, using its bases as seen under the current quality
/// threshold. Reads without a difference at a covered position vote for the
/// reference.
pub fn consensus_diffs<S: AlignmentSource + ?Sized>(
    reads: &[&Alignment],
    span_start: usize,
    src: &S,
) -> Result<Vec<Difference>, StrainError> {
    let threshold = src.quality_threshold();
    let coverage = CoverageIndex::new(reads.iter().map(|a| a.reference_segment()));

    let mut votes: BTreeMap<usize, PositionVotes> = BTreeMap::new();
    for read in reads {
        for (position, diffs) in &read.diffs(src).iter().chunk_by(|d| d.position1) {
            let entry = votes.entry(position).or_default();
            let mut inserted = false;
            for diff in diffs {
                if diff.is_reference_gap() {
                    if !inserted {
                        entry.insertions.add(diff.effective_base2(threshold));
                        inserted = true;
                    }
                } else {
                    entry.columns.add(diff.effective_base2(threshold));
                }
            }
        }
    }

    let mut consensus = Vec::new();
    let (mut inserted, mut deleted) = (0usize, 0usize);
    for (&position, position_votes) in &votes {
        let depth = coverage.at(position);
        let mut calls: ArrayVec<Difference, 2> = ArrayVec::new();
        let query_pos =
            |inserted: usize, deleted: usize| position + 1 + inserted - span_start - deleted;

        if let Some(base) = position_votes.insertions.winner(position, depth)? {
            if base != GAP {
                calls.push(Difference::new(position, GAP, query_pos(inserted, deleted), base));
                inserted += 1;
            }
        }

        if let Some(base) = position_votes.columns.winner(position, depth)? {
            let reference_base = src.reference_base(position);
            if !base.eq_ignore_ascii_case(&reference_base) {
                calls.push(Difference::new(
                    position,
                    reference_base,
                    query_pos(inserted, deleted),
                    base,
                ));
                if base == GAP {
                    deleted += 1;
                }
            }
        }
        consensus.extend(calls);
    }

    log::debug!(
        "Consensus over {} reads: {} voted positions, {} differences",
        reads.len(),
        votes.len(),
        consensus.len()
    );
    Ok(consensus)
}
