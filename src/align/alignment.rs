//! The alignment of one sequence (read, mate pair or strain consensus) to the
//! reference, with lazily derived differences and coordinate mapping.

use super::diff_index::DiffIndex;
use super::difference::{Difference, FILLER, GAP};
use super::segment::{CloneId, ReadId, Segment, SequenceRef, StrainId};
use once_cell::unsync::OnceCell;
use std::cell::Cell;

/// Where an alignment's differences and unknown regions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentKind {
    /// A single read; differences are supplied by the importer.
    Simple(ReadId),
    /// Two mates merged into one virtual alignment.
    PairedMerge { pair: CloneId, mates: [ReadId; 2] },
    /// Plurality consensus over the members of a strain.
    Consensus(StrainId),
}

impl AlignmentKind {
    pub fn sequence(&self) -> SequenceRef {
        match self {
            AlignmentKind::Simple(read) => SequenceRef::Read(*read),
            AlignmentKind::PairedMerge { pair, .. } => SequenceRef::Clone(*pair),
            AlignmentKind::Consensus(strain) => SequenceRef::Strain(*strain),
        }
    }
}

/// Context an alignment needs to answer queries: the reference bases, the
/// live quality threshold and the recipes for derived data.
pub trait AlignmentSource {
    fn reference_len(&self) -> usize;

    /// Reference base at a 1-based position.
    fn reference_base(&self, position: usize) -> u8;

    fn quality_threshold(&self) -> u8;

    /// Computes the differences of an alignment that has none cached.
    fn derive_diffs(&self, alignment: &Alignment) -> Vec<Difference>;

    /// Computes the uncovered reference regions inside an alignment's span.
    fn derive_unknown_regions(&self, alignment: &Alignment) -> Vec<Segment>;
}

#[derive(Debug, Clone)]
pub struct Alignment {
    kind: AlignmentKind,
    reference: Segment,
    query: Cell<Option<Segment>>,
    is_forward: bool,
    diffs: OnceCell<DiffIndex>,
    unknown_regions: OnceCell<Vec<Segment>>,
    identity: OnceCell<f64>,
}

impl Alignment {
    /// Creates an alignment. Supplied differences are indexed immediately;
    /// otherwise they are derived on first access.
    pub fn new(
        kind: AlignmentKind,
        reference: Segment,
        query: Option<Segment>,
        is_forward: bool,
        diffs: Option<Vec<Difference>>,
    ) -> Self {
        assert_eq!(
            reference.sequence,
            SequenceRef::Reference,
            "Alignment reference segment must lie on the reference"
        );
        let alignment = Alignment {
            kind,
            reference,
            query: Cell::new(query),
            is_forward,
            diffs: OnceCell::new(),
            unknown_regions: OnceCell::new(),
            identity: OnceCell::new(),
        };
        if let Some(diffs) = diffs {
            let index = alignment.process_diffs(diffs);
            let _ = alignment.diffs.set(index);
        }
        alignment
    }

    pub fn kind(&self) -> AlignmentKind {
        self.kind
    }

    pub fn reference_segment(&self) -> Segment {
        self.reference
    }

    pub fn is_forward(&self) -> bool {
        self.is_forward
    }

    pub fn diffs_loaded(&self) -> bool {
        self.diffs.get().is_some()
    }

    /// Indexes `diffs` and derives the query segment from the reference span
    /// and the gap counts.
    fn process_diffs(&self, diffs: Vec<Difference>) -> DiffIndex {
        let index = DiffIndex::new(diffs);
        let length = index.query_length(self.reference.len());
        let start = match self.query.get() {
            Some(query) if query.start > 0 => query.start,
            _ => 1,
        };
        self.query.set(Some(Segment::new(
            self.kind.sequence(),
            start,
            start + length - 1,
        )));
        index
    }

    pub fn diff_index<S: AlignmentSource + ?Sized>(&self, src: &S) -> &DiffIndex {
        self.diffs
            .get_or_init(|| self.process_diffs(src.derive_diffs(self)))
    }

    pub fn diffs<S: AlignmentSource + ?Sized>(&self, src: &S) -> &[Difference] {
        self.diff_index(src).diffs()
    }

    /// Replaces the differences. `None` drops them so they are derived again
    /// on next access.
    pub fn set_diffs(&mut self, diffs: Option<Vec<Difference>>) {
        self.diffs = OnceCell::new();
        self.identity = OnceCell::new();
        if let Some(diffs) = diffs {
            let index = self.process_diffs(diffs);
            let _ = self.diffs.set(index);
        }
    }

    /// Drops every derived cache.
    pub fn invalidate(&mut self) {
        self.diffs = OnceCell::new();
        self.unknown_regions = OnceCell::new();
        self.identity = OnceCell::new();
    }

    pub(crate) fn set_reference_segment(&mut self, reference: Segment) {
        assert_eq!(reference.sequence, SequenceRef::Reference);
        self.reference = reference;
        self.identity = OnceCell::new();
        self.unknown_regions = OnceCell::new();
    }

    /// The query-side segment, deriving differences if needed to know its length.
    pub fn query_segment<S: AlignmentSource + ?Sized>(&self, src: &S) -> Segment {
        self.diff_index(src);
        self.query
            .get()
            .expect("Query segment is set whenever differences are indexed")
    }

    fn query_start<S: AlignmentSource + ?Sized>(&self, src: &S) -> usize {
        self.query_segment(src).start
    }

    pub fn reference_pos<S: AlignmentSource + ?Sized>(&self, query_pos: usize, src: &S) -> usize {
        let query_start = self.query_start(src);
        self.diff_index(src)
            .reference_pos(query_pos, self.reference.start, query_start)
    }

    pub fn pos_from_reference<S: AlignmentSource + ?Sized>(
        &self,
        reference_pos: usize,
        src: &S,
    ) -> usize {
        let query_start = self.query_start(src);
        self.diff_index(src)
            .pos_from_reference(reference_pos, self.reference.start, query_start)
    }

    pub fn diff_at_position<S: AlignmentSource + ?Sized>(
        &self,
        query_pos: usize,
        src: &S,
    ) -> Option<&Difference> {
        self.diff_index(src).at_query_position(query_pos)
    }

    pub fn diff_at_reference_position<S: AlignmentSource + ?Sized>(
        &self,
        reference_pos: usize,
        src: &S,
    ) -> Option<&Difference> {
        self.diff_index(src).at_reference_position(reference_pos)
    }

    pub fn count_diffs_in_range<S: AlignmentSource + ?Sized>(
        &self,
        start: usize,
        end: usize,
        src: &S,
    ) -> usize {
        self.diff_index(src)
            .count_in_range(start, end, src.quality_threshold())
    }

    /// Base of the aligned sequence at a query position.
    pub fn base<S: AlignmentSource + ?Sized>(&self, query_pos: usize, src: &S) -> u8 {
        let query = self.query_segment(src);
        assert!(
            query.contains_position(query_pos),
            "Query position {} outside {:?} {}",
            query_pos,
            query.sequence,
            query
        );
        match self.diff_at_position(query_pos, src) {
            Some(diff) => diff.effective_base2(src.quality_threshold()),
            None => src.reference_base(self.reference_pos(query_pos, src)),
        }
    }

    /// Base of the aligned sequence in reference column `reference_pos`;
    /// a gap if the sequence deletes that column.
    pub fn base_from_reference<S: AlignmentSource + ?Sized>(
        &self,
        reference_pos: usize,
        src: &S,
    ) -> u8 {
        match self.diff_at_reference_position(reference_pos, src) {
            Some(diff) => diff.effective_base2(src.quality_threshold()),
            None => src.reference_base(reference_pos),
        }
    }

    pub fn unknown_regions<S: AlignmentSource + ?Sized>(&self, src: &S) -> &[Segment] {
        self.unknown_regions
            .get_or_init(|| src.derive_unknown_regions(self))
    }

    /// True outside the reference span and inside any unknown region.
    pub fn is_uncovered<S: AlignmentSource + ?Sized>(&self, reference_pos: usize, src: &S) -> bool {
        if !self.reference.contains_position(reference_pos) {
            return true;
        }
        let regions = self.unknown_regions(src);
        let candidate = regions.partition_point(|region| region.end < reference_pos);
        regions
            .get(candidate)
            .is_some_and(|region| region.contains_position(reference_pos))
    }

    pub fn uncovered_length<S: AlignmentSource + ?Sized>(&self, src: &S) -> usize {
        self.unknown_regions(src)
            .iter()
            .filter(|region| region.intersects(&self.reference))
            .map(|region| region.end.min(self.reference.end) + 1 - region.start.max(self.reference.start))
            .sum()
    }

    fn fill_base<S: AlignmentSource + ?Sized>(
        &self,
        reference_pos: usize,
        fill_from_consensus: bool,
        src: &S,
    ) -> u8 {
        if fill_from_consensus && (1..=src.reference_len()).contains(&reference_pos) {
            src.reference_base(reference_pos)
        } else {
            FILLER
        }
    }

    /// The aligned sequence over its whole reference span.
    pub fn bases<S: AlignmentSource + ?Sized>(&self, fill_from_consensus: bool, src: &S) -> Vec<u8> {
        self.bases_in_range(
            fill_from_consensus,
            self.reference.start,
            self.reference.end,
            src,
        )
    }

    /// One base per reference column in `[start, end]`. Uncovered columns take
    /// the reference base when `fill_from_consensus` is set, the filler base
    /// otherwise. Inserted bases are not shown.
    pub fn bases_in_range<S: AlignmentSource + ?Sized>(
        &self,
        fill_from_consensus: bool,
        start: usize,
        end: usize,
        src: &S,
    ) -> Vec<u8> {
        (start..=end)
            .map(|pos| {
                if self.is_uncovered(pos, src) {
                    self.fill_base(pos, fill_from_consensus, src)
                } else {
                    self.base_from_reference(pos, src)
                }
            })
            .collect()
    }

    /// The ungapped aligned sequence in query order, inserted bases included.
    /// Uncovered stretches contribute one filled base per reference position.
    pub fn sequence<S: AlignmentSource + ?Sized>(&self, fill_from_consensus: bool, src: &S) -> Vec<u8> {
        let threshold = src.quality_threshold();
        let index = self.diff_index(src);
        let mut sequence = Vec::with_capacity(self.reference.len());
        for pos in self.reference.start..=self.reference.end {
            if self.is_uncovered(pos, src) {
                sequence.push(self.fill_base(pos, fill_from_consensus, src));
                continue;
            }
            sequence.extend(
                index
                    .insertions_before(pos)
                    .iter()
                    .map(|d| d.effective_base2(threshold)),
            );
            let base = self.base_from_reference(pos, src);
            if base != GAP {
                sequence.push(base);
            }
        }
        sequence
    }

    /// Multiple-alignment row over `[start, end]`. Each entry `p` of the
    /// sorted `gap_positions` adds one column before reference position `p`;
    /// those columns show this sequence's inserted bases in order, padded with
    /// gaps. Insertions longer than the supplied columns are truncated.
    pub fn msa_bases<S: AlignmentSource + ?Sized>(
        &self,
        fill_from_consensus: bool,
        gap_positions: &[usize],
        start: usize,
        end: usize,
        src: &S,
    ) -> Vec<u8> {
        let mut row = Vec::with_capacity((end + 1).saturating_sub(start) + gap_positions.len());
        let mut next_gap = gap_positions.partition_point(|&p| p < start);
        let threshold = src.quality_threshold();

        for pos in start..=end {
            let columns = gap_positions[next_gap..]
                .iter()
                .take_while(|&&p| p == pos)
                .count();
            next_gap += columns;

            if columns > 0 {
                let covered = pos > self.reference.start
                    && !self.is_uncovered(pos - 1, src)
                    && !self.is_uncovered(pos, src);
                if covered {
                    let inserted = self.diff_index(src).insertions_before(pos);
                    row.extend(
                        inserted
                            .iter()
                            .map(|d| d.effective_base2(threshold))
                            .chain(std::iter::repeat(GAP))
                            .take(columns),
                    );
                } else {
                    let filler = if fill_from_consensus { GAP } else { FILLER };
                    row.extend(std::iter::repeat(filler).take(columns));
                }
            }

            row.push(if self.is_uncovered(pos, src) {
                self.fill_base(pos, fill_from_consensus, src)
            } else {
                self.base_from_reference(pos, src)
            });
        }
        row
    }

    /// Fraction of covered reference bases without a difference.
    ///
    /// When the differences are not cached they are derived for the count
    /// only and left unloaded.
    pub fn identity<S: AlignmentSource + ?Sized>(&self, src: &S) -> f64 {
        *self.identity.get_or_init(|| {
            let diff_count = match self.diffs.get() {
                Some(index) => index.len(),
                None => src.derive_diffs(self).len(),
            };
            let covered = self
                .reference
                .len()
                .saturating_sub(self.uncovered_length(src));
            if covered == 0 {
                return 0.0;
            }
            (covered as f64 - diff_count as f64) / covered as f64
        })
    }
}
