//! The project arena: one reference plus every read, mate pair and strain
//! aligned to it, kept consistent across regrouping and reference edits.

use super::records::{MatePair, NamedItem, Read, Readable, Strain};
use super::reference::Reference;
use super::summary::{EditScope, EditSummary, StrainSummary};
use crate::align::{
    consensus_diffs, edit_alignment, mate_gap, mate_pair_span, merge_mate_diffs, strain_span,
    strain_unknown_regions, Alignment, AlignmentKind, AlignmentSource, CloneId, Difference,
    EditedAlignment, ReadId, ReferenceEdit, Segment, SequenceRef, StrainError, StrainId,
};
use arrayvec::ArrayVec;
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug)]
pub struct Project {
    reference: Reference,
    reads: Vec<Read>,
    pairs: Vec<MatePair>,
    strains: Vec<Strain>,
    names: HashMap<String, NamedItem>,
    quality_threshold: u8,
}

impl Project {
    pub fn new(reference: Reference) -> Self {
        Project {
            reference,
            reads: Vec::new(),
            pairs: Vec::new(),
            strains: Vec::new(),
            names: HashMap::new(),
            quality_threshold: 0,
        }
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn read(&self, id: ReadId) -> &Read {
        &self.reads[id.0]
    }

    pub fn pair(&self, id: CloneId) -> &MatePair {
        &self.pairs[id.0]
    }

    pub fn strain(&self, id: StrainId) -> &Strain {
        &self.strains[id.0]
    }

    pub fn read_count(&self) -> usize {
        self.reads.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn strain_count(&self) -> usize {
        self.strains.len()
    }

    pub fn read_ids(&self) -> impl Iterator<Item = ReadId> {
        (0..self.reads.len()).map(ReadId)
    }

    pub fn pair_ids(&self) -> impl Iterator<Item = CloneId> {
        (0..self.pairs.len()).map(CloneId)
    }

    pub fn strain_ids(&self) -> impl Iterator<Item = StrainId> {
        (0..self.strains.len()).map(StrainId)
    }

    pub fn lookup(&self, name: &str) -> Option<NamedItem> {
        self.names.get(name).copied()
    }

    pub fn readable_name(&self, readable: Readable) -> &str {
        match readable {
            Readable::Read(id) => &self.reads[id.0].name,
            Readable::Pair(id) => &self.pairs[id.0].name,
        }
    }

    pub fn readable_alignment(&self, readable: Readable) -> &Alignment {
        match readable {
            Readable::Read(id) => &self.reads[id.0].alignment,
            Readable::Pair(id) => &self.pairs[id.0].alignment,
        }
    }

    fn check_name(&self, name: &str) -> Result<(), StrainError> {
        if self.names.contains_key(name) {
            return Err(StrainError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// Adds an aligned read. `query_start` is the position within the read of
    /// the first aligned base; 0 is taken as 1.
    pub fn add_read(
        &mut self,
        name: &str,
        span: Segment,
        query_start: usize,
        is_forward: bool,
        diffs: Vec<Difference>,
    ) -> Result<ReadId, StrainError> {
        self.check_name(name)?;
        assert!(
            span.start >= 1 && span.end <= self.reference.len(),
            "Read {} span {} outside reference of length {}",
            name,
            span,
            self.reference.len()
        );
        let id = ReadId(self.reads.len());
        let query = Segment::new(
            SequenceRef::Read(id),
            query_start,
            query_start.saturating_sub(1),
        );
        let alignment = Alignment::new(
            AlignmentKind::Simple(id),
            span,
            Some(query),
            is_forward,
            Some(diffs),
        );
        self.reads.push(Read {
            name: name.to_string(),
            alignment,
            pair: None,
            strain: None,
        });
        self.names.insert(name.to_string(), NamedItem::Read(id));
        Ok(id)
    }

    /// Joins two reads into a mate pair. Mates leave any strain they were in.
    pub fn pair_reads(
        &mut self,
        name: &str,
        first: ReadId,
        second: ReadId,
    ) -> Result<CloneId, StrainError> {
        if first == second {
            let mate = self.reads[first.0].name.clone();
            return Err(StrainError::SelfPair(mate.clone(), mate));
        }
        for mate in [first, second] {
            if let Some(pair) = self.reads[mate.0].pair {
                return Err(StrainError::AlreadyPaired {
                    read: self.reads[mate.0].name.clone(),
                    pair: self.pairs[pair.0].name.clone(),
                });
            }
        }
        self.check_name(name)?;

        for mate in [first, second] {
            self.remove_from_strain(Readable::Read(mate));
        }
        let id = CloneId(self.pairs.len());
        let mates = [first, second];
        let alignment = self.pair_alignment(id, mates);
        self.pairs.push(MatePair {
            name: name.to_string(),
            mates,
            alignment,
            strain: None,
        });
        for mate in mates {
            self.reads[mate.0].pair = Some(id);
        }
        self.names.insert(name.to_string(), NamedItem::Pair(id));
        Ok(id)
    }

    pub fn add_strain(&mut self, name: &str) -> Result<StrainId, StrainError> {
        self.check_name(name)?;
        let id = StrainId(self.strains.len());
        self.strains.push(Strain {
            name: name.to_string(),
            members: Vec::new(),
            alignment: None,
        });
        self.names.insert(name.to_string(), NamedItem::Strain(id));
        Ok(id)
    }

    fn check_assignable(&self, readable: Readable) -> Result<(), StrainError> {
        if let Readable::Read(read) = readable {
            if let Some(pair) = self.reads[read.0].pair {
                return Err(StrainError::MateOfPair {
                    read: self.reads[read.0].name.clone(),
                    pair: self.pairs[pair.0].name.clone(),
                });
            }
        }
        Ok(())
    }

    fn strain_of(&self, readable: Readable) -> Option<StrainId> {
        match readable {
            Readable::Read(id) => self.reads[id.0].strain,
            Readable::Pair(id) => self.pairs[id.0].strain,
        }
    }

    fn set_strain_of(&mut self, readable: Readable, strain: Option<StrainId>) {
        match readable {
            Readable::Read(id) => self.reads[id.0].strain = strain,
            Readable::Pair(id) => self.pairs[id.0].strain = strain,
        }
    }

    fn detach(&mut self, readable: Readable, strain: StrainId) {
        self.strains[strain.0].members.retain(|&m| m != readable);
        self.set_strain_of(readable, None);
    }

    /// Puts `readable` into `strain`, moving it out of any other strain.
    pub fn add_to_strain(&mut self, strain: StrainId, readable: Readable) -> Result<(), StrainError> {
        self.check_assignable(readable)?;
        match self.strain_of(readable) {
            Some(current) if current == strain => return Ok(()),
            Some(current) => {
                self.detach(readable, current);
                self.rebuild_strain(current);
            }
            None => {}
        }
        self.strains[strain.0].members.push(readable);
        self.set_strain_of(readable, Some(strain));
        self.rebuild_strain(strain);
        log::debug!(
            "Added {} to strain {}",
            self.readable_name(readable),
            self.strains[strain.0].name
        );
        Ok(())
    }

    /// Takes `readable` out of its strain, returning the strain it left.
    pub fn remove_from_strain(&mut self, readable: Readable) -> Option<StrainId> {
        let strain = self.strain_of(readable)?;
        self.detach(readable, strain);
        self.rebuild_strain(strain);
        Some(strain)
    }

    /// Replaces the membership of `strain`. Members taken from other strains
    /// leave them; nothing changes if any member is rejected.
    pub fn set_strain_members(
        &mut self,
        strain: StrainId,
        members: Vec<Readable>,
    ) -> Result<(), StrainError> {
        for &member in &members {
            self.check_assignable(member)?;
        }

        let previous = std::mem::take(&mut self.strains[strain.0].members);
        for member in previous {
            self.set_strain_of(member, None);
        }

        let mut touched = BTreeSet::new();
        for member in members.into_iter().unique() {
            if let Some(other) = self.strain_of(member) {
                self.detach(member, other);
                touched.insert(other);
            }
            self.strains[strain.0].members.push(member);
            self.set_strain_of(member, Some(strain));
        }
        touched.insert(strain);
        for id in touched {
            self.rebuild_strain(id);
        }
        Ok(())
    }

    /// Replaces a read's differences and drops everything derived from them.
    pub fn set_read_diffs(&mut self, read: ReadId, diffs: Vec<Difference>) {
        self.reads[read.0].alignment.set_diffs(Some(diffs));
        let pair = self.reads[read.0].pair;
        if let Some(pair) = pair {
            self.pairs[pair.0].alignment.invalidate();
        }
        let strain = self.reads[read.0]
            .strain
            .or_else(|| pair.and_then(|p| self.pairs[p.0].strain));
        if let Some(strain) = strain {
            self.rebuild_strain(strain);
        }
    }

    /// Stored differences are kept; strain consensus is recomputed under the
    /// new threshold.
    pub fn set_quality_threshold(&mut self, threshold: u8) {
        if threshold == self.quality_threshold {
            return;
        }
        self.quality_threshold = threshold;
        for alignment in self.strains.iter_mut().filter_map(|s| s.alignment.as_mut()) {
            alignment.invalidate();
        }
        log::debug!("Quality threshold set to {}", threshold);
    }

    /// Reads that preserve their sequence through an edit: the given reads and
    /// both mates of the given pairs.
    pub fn scope_for(&self, readables: &[Readable]) -> EditScope {
        EditScope::Reads(
            readables
                .iter()
                .flat_map(|&r| self.member_reads(r))
                .collect(),
        )
    }

    /// Applies a single-base edit to the reference and carries it through
    /// every alignment. Each read is rewritten once, then the pairs and strains
    /// holding a rewritten read are rebuilt.
    ///
    /// Nothing changes when the edit fails: every read is rewritten before the
    /// reference is touched.
    pub fn edit_reference(
        &mut self,
        edit: ReferenceEdit,
        scope: &EditScope,
    ) -> Result<EditSummary, StrainError> {
        let project: &Project = self;
        let updates = project
            .reads
            .iter()
            .enumerate()
            .filter_map(|(i, read)| {
                let id = ReadId(i);
                edit_alignment(&read.alignment, &edit, scope.preserves(id), project)
                    .map_err(|e| {
                        log::error!("Read {}: {}", read.name, e);
                        e
                    })
                    .transpose()
                    .map(|update| update.map(|update| (id, update)))
            })
            .collect::<Result<Vec<(ReadId, EditedAlignment)>, StrainError>>()?;

        self.reference.apply(&edit)?;

        let mut reads = Vec::with_capacity(updates.len());
        let mut pairs = BTreeSet::new();
        let mut strains = BTreeSet::new();
        for (id, update) in updates {
            let read = &mut self.reads[id.0];
            read.alignment.set_reference_segment(update.reference);
            read.alignment.set_diffs(Some(update.diffs));
            pairs.extend(read.pair);
            strains.extend(read.strain);
            reads.push(id);
        }
        for &pair in &pairs {
            self.rebuild_pair(pair);
            strains.extend(self.pairs[pair.0].strain);
        }
        for &strain in &strains {
            self.rebuild_strain(strain);
        }

        log::info!(
            "Reference edit {} touched {} reads, {} pairs, {} strains",
            edit,
            reads.len(),
            pairs.len(),
            strains.len()
        );
        Ok(EditSummary {
            edit,
            reads,
            pairs: pairs.into_iter().collect(),
            strains: strains.into_iter().collect(),
        })
    }

    /// Consensus sequence of a strain, `None` while it has no members.
    pub fn strain_consensus(&self, strain: StrainId, fill_from_consensus: bool) -> Option<Vec<u8>> {
        self.strains[strain.0]
            .alignment
            .as_ref()
            .map(|alignment| alignment.sequence(fill_from_consensus, self))
    }

    pub fn strain_summary(&self, strain: StrainId) -> StrainSummary {
        let record = &self.strains[strain.0];
        let reads = record
            .members
            .iter()
            .map(|&m| self.member_reads(m).len())
            .sum();
        let mut summary = StrainSummary {
            name: record.name.clone(),
            members: record.members.len(),
            reads,
            span: None,
            identity: None,
            diffs: 0,
            unknown_bases: 0,
        };
        if let Some(alignment) = &record.alignment {
            summary.span = Some(alignment.reference_segment());
            summary.diffs = alignment.diffs(self).len();
            summary.identity = Some(alignment.identity(self));
            summary.unknown_bases = alignment.uncovered_length(self);
        }
        summary
    }

    fn member_reads(&self, readable: Readable) -> ArrayVec<ReadId, 2> {
        match readable {
            Readable::Read(id) => [id].into_iter().collect(),
            Readable::Pair(id) => ArrayVec::from(self.pairs[id.0].mates),
        }
    }

    /// Read alignments of a strain, mates of member pairs included.
    fn strain_reads(&self, strain: StrainId) -> Vec<&Alignment> {
        self.strains[strain.0]
            .members
            .iter()
            .flat_map(|&m| self.member_reads(m))
            .map(|id| &self.reads[id.0].alignment)
            .collect()
    }

    fn pair_alignment(&self, id: CloneId, mates: [ReadId; 2]) -> Alignment {
        let first = &self.reads[mates[0].0].alignment;
        let second = &self.reads[mates[1].0].alignment;
        Alignment::new(
            AlignmentKind::PairedMerge { pair: id, mates },
            mate_pair_span(first.reference_segment(), second.reference_segment()),
            Some(Segment::new(SequenceRef::Clone(id), 1, 0)),
            first.is_forward(),
            None,
        )
    }

    fn rebuild_pair(&mut self, pair: CloneId) {
        let mates = self.pairs[pair.0].mates;
        self.pairs[pair.0].alignment = self.pair_alignment(pair, mates);
    }

    fn rebuild_strain(&mut self, strain: StrainId) {
        let alignment = strain_span(&self.strain_reads(strain)).map(|span| {
            Alignment::new(
                AlignmentKind::Consensus(strain),
                span,
                Some(Segment::new(SequenceRef::Strain(strain), 1, 0)),
                true,
                None,
            )
        });
        self.strains[strain.0].alignment = alignment;
    }
}

impl AlignmentSource for Project {
    fn reference_len(&self) -> usize {
        self.reference.len()
    }

    fn reference_base(&self, position: usize) -> u8 {
        self.reference.base(position)
    }

    fn quality_threshold(&self) -> u8 {
        self.quality_threshold
    }

    fn derive_diffs(&self, alignment: &Alignment) -> Vec<Difference> {
        match alignment.kind() {
            // Read differences are supplied, never derived
            AlignmentKind::Simple(_) => Vec::new(),
            AlignmentKind::PairedMerge { mates, .. } => merge_mate_diffs(
                &self.reads[mates[0].0].alignment,
                &self.reads[mates[1].0].alignment,
                self,
            ),
            AlignmentKind::Consensus(strain) => {
                let reads = self.strain_reads(strain);
                consensus_diffs(&reads, alignment.reference_segment().start, self)
                    .unwrap_or_else(|e| {
                        log::error!(
                            "Consensus for strain {} failed: {}",
                            self.strains[strain.0].name,
                            e
                        );
                        Vec::new()
                    })
            }
        }
    }

    fn derive_unknown_regions(&self, alignment: &Alignment) -> Vec<Segment> {
        match alignment.kind() {
            AlignmentKind::Simple(_) => Vec::new(),
            AlignmentKind::PairedMerge { mates, .. } => mate_gap(
                self.reads[mates[0].0].alignment.reference_segment(),
                self.reads[mates[1].0].alignment.reference_segment(),
            )
            .into_iter()
            .collect(),
            AlignmentKind::Consensus(strain) => strain_unknown_regions(&self.strain_reads(strain)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::GAP;

    // Position p holds "ACGT"[(p - 1) % 4]
    fn project() -> Project {
        Project::new(Reference::new("chr1", b"ACGT".repeat(50)))
    }

    fn snv(project: &Project, position: usize, query_pos: usize) -> Difference {
        let reference_base = project.reference().base(position);
        let base = if reference_base == b'A' { b'G' } else { b'A' };
        Difference::new(position, reference_base, query_pos, base)
    }

    fn add(project: &mut Project, name: &str, start: usize, end: usize) -> ReadId {
        project
            .add_read(name, Segment::on_reference(start, end), 1, true, Vec::new())
            .unwrap()
    }

    #[test]
    fn names_are_unique_across_kinds() {
        let mut project = project();
        let read = add(&mut project, "r1", 1, 10);
        assert_eq!(
            project.add_read("r1", Segment::on_reference(1, 10), 1, true, Vec::new()),
            Err(StrainError::DuplicateName("r1".to_string()))
        );
        assert_eq!(
            project.add_strain("r1"),
            Err(StrainError::DuplicateName("r1".to_string()))
        );
        assert_eq!(project.lookup("r1"), Some(NamedItem::Read(read)));
        assert_eq!(project.lookup("r2"), None);
        assert_eq!(project.read_count(), 1);
    }

    #[test]
    fn pairing_rules() {
        let mut project = project();
        let r1 = add(&mut project, "r1", 1, 10);
        let r2 = add(&mut project, "r2", 20, 30);
        let r3 = add(&mut project, "r3", 40, 50);
        let pair = project.pair_reads("c1", r1, r2).unwrap();
        assert_eq!(project.read(r1).pair, Some(pair));

        assert_eq!(
            project.pair_reads("c2", r3, r1),
            Err(StrainError::AlreadyPaired {
                read: "r1".to_string(),
                pair: "c1".to_string()
            })
        );
        assert!(matches!(
            project.pair_reads("c2", r3, r3),
            Err(StrainError::SelfPair(_, _))
        ));
        let strain = project.add_strain("s1").unwrap();
        assert_eq!(
            project.add_to_strain(strain, Readable::Read(r2)),
            Err(StrainError::MateOfPair {
                read: "r2".to_string(),
                pair: "c1".to_string()
            })
        );
        assert!(project.strain(strain).is_empty());
    }

    #[test]
    fn pair_merges_mate_diffs_on_demand() {
        let mut project = project();
        let left = vec![snv(&project, 10, 10), snv(&project, 20, 20)];
        let right = vec![snv(&project, 30, 5), snv(&project, 40, 15)];
        let r1 = project
            .add_read("r1", Segment::on_reference(1, 25), 1, true, left)
            .unwrap();
        let r2 = project
            .add_read("r2", Segment::on_reference(26, 50), 1, false, right)
            .unwrap();
        let pair = project.pair_reads("c1", r1, r2).unwrap();

        let alignment = &project.pair(pair).alignment;
        assert!(!alignment.diffs_loaded());
        let positions: Vec<(usize, usize)> = alignment
            .diffs(&project)
            .iter()
            .map(|d| (d.position1, d.position2))
            .collect();
        assert_eq!(positions, vec![(10, 10), (20, 20), (30, 30), (40, 40)]);
        assert!(alignment.unknown_regions(&project).is_empty());
        assert_eq!(alignment.query_segment(&project).len(), 50);
    }

    #[test]
    fn pair_gap_is_unknown() {
        let mut project = project();
        let r1 = add(&mut project, "r1", 1, 10);
        let r2 = add(&mut project, "r2", 21, 30);
        let pair = project.pair_reads("c1", r2, r1).unwrap();
        let alignment = &project.pair(pair).alignment;
        assert_eq!(alignment.reference_segment(), Segment::on_reference(1, 30));
        assert_eq!(
            alignment.unknown_regions(&project),
            &[Segment::on_reference(11, 20)]
        );
        assert!(alignment.is_uncovered(15, &project));
        assert!((alignment.identity(&project) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn strain_consensus_follows_majority() {
        let mut project = project();
        let strain = project.add_strain("s1").unwrap();
        for name in ["r1", "r2", "r3"] {
            let diffs = if name == "r3" {
                Vec::new()
            } else {
                vec![snv(&project, 10, 10)]
            };
            let read = project
                .add_read(name, Segment::on_reference(1, 50), 1, true, diffs)
                .unwrap();
            project.add_to_strain(strain, Readable::Read(read)).unwrap();
        }

        let consensus = project.strain_consensus(strain, false).unwrap();
        assert_eq!(consensus.len(), 50);
        assert_eq!(consensus[9], b'A');
        assert_eq!(consensus[10], project.reference().base(11));

        let summary = project.strain_summary(strain);
        assert_eq!(summary.members, 3);
        assert_eq!(summary.reads, 3);
        assert_eq!(summary.diffs, 1);
        assert_eq!(summary.span, Some(Segment::on_reference(1, 50)));
        assert!((summary.identity.unwrap() - 0.98).abs() < 1e-12);
    }

    #[test]
    fn split_vote_leaves_reference() {
        let mut project = project();
        let strain = project.add_strain("s1").unwrap();
        let diffs = vec![snv(&project, 10, 10)];
        let r1 = project
            .add_read("r1", Segment::on_reference(1, 50), 1, true, diffs)
            .unwrap();
        let r2 = add(&mut project, "r2", 1, 50);
        project
            .set_strain_members(strain, vec![Readable::Read(r1), Readable::Read(r2)])
            .unwrap();
        assert_eq!(project.strain_summary(strain).diffs, 0);
    }

    #[test]
    fn pair_contributes_both_mates() {
        let mut project = project();
        let r1 = add(&mut project, "r1", 1, 20);
        let r2 = add(&mut project, "r2", 41, 60);
        let r3 = add(&mut project, "r3", 10, 30);
        let pair = project.pair_reads("c1", r1, r2).unwrap();
        let strain = project.add_strain("s1").unwrap();
        project
            .set_strain_members(strain, vec![Readable::Pair(pair), Readable::Read(r3)])
            .unwrap();

        let summary = project.strain_summary(strain);
        assert_eq!(summary.members, 2);
        assert_eq!(summary.reads, 3);
        assert_eq!(summary.span, Some(Segment::on_reference(1, 60)));
        assert_eq!(summary.unknown_bases, 10);
        let consensus = project.strain_consensus(strain, false).unwrap();
        assert_eq!(&consensus[30..40], b"nnnnnnnnnn");
    }

    #[test]
    fn moving_a_member_rebuilds_both_strains() {
        let mut project = project();
        let r1 = add(&mut project, "r1", 1, 20);
        let r2 = add(&mut project, "r2", 30, 60);
        let s1 = project.add_strain("s1").unwrap();
        let s2 = project.add_strain("s2").unwrap();
        project
            .set_strain_members(s1, vec![Readable::Read(r1), Readable::Read(r2)])
            .unwrap();
        assert_eq!(
            project.strain(s1).alignment.as_ref().unwrap().reference_segment(),
            Segment::on_reference(1, 60)
        );

        project.add_to_strain(s2, Readable::Read(r2)).unwrap();
        assert_eq!(project.strain(s1).members, vec![Readable::Read(r1)]);
        assert_eq!(project.read(r2).strain, Some(s2));
        assert_eq!(
            project.strain(s1).alignment.as_ref().unwrap().reference_segment(),
            Segment::on_reference(1, 20)
        );
        assert_eq!(
            project.strain(s2).alignment.as_ref().unwrap().reference_segment(),
            Segment::on_reference(30, 60)
        );

        assert_eq!(project.remove_from_strain(Readable::Read(r1)), Some(s1));
        assert!(project.strain(s1).alignment.is_none());
        assert_eq!(project.strain_consensus(s1, true), None);
        assert_eq!(project.strain_summary(s1).identity, None);
        assert_eq!(project.remove_from_strain(Readable::Read(r1)), None);
    }

    #[test]
    fn quality_threshold_revotes_without_rewriting() {
        let mut project = project();
        let strain = project.add_strain("s1").unwrap();
        for name in ["r1", "r2"] {
            let reference_base = project.reference().base(10);
            let diffs = vec![Difference::with_quality(10, reference_base, 10, b'A', 15)];
            let read = project
                .add_read(name, Segment::on_reference(1, 20), 1, true, diffs)
                .unwrap();
            project.add_to_strain(strain, Readable::Read(read)).unwrap();
        }
        assert_eq!(project.strain_consensus(strain, false).unwrap()[9], b'A');

        project.set_quality_threshold(20);
        assert_eq!(project.strain_consensus(strain, false).unwrap()[9], b'N');
        let stored = project.read(ReadId(0)).alignment.diffs(&project)[0];
        assert_eq!(stored.base2, b'A');
    }

    #[test]
    fn failed_consensus_degrades_to_reference() {
        let mut project = project();
        let strain = project.add_strain("s1").unwrap();
        // A difference lying outside its own read
        let diffs = vec![snv(&project, 10, 10)];
        let read = project
            .add_read("r1", Segment::on_reference(1, 5), 1, true, diffs)
            .unwrap();
        project.add_to_strain(strain, Readable::Read(read)).unwrap();
        assert_eq!(project.strain_summary(strain).diffs, 0);
    }

    #[test]
    fn set_read_diffs_reaches_pair_and_strain() {
        let mut project = project();
        let r1 = add(&mut project, "r1", 1, 20);
        let r2 = add(&mut project, "r2", 21, 40);
        let pair = project.pair_reads("c1", r1, r2).unwrap();
        let strain = project.add_strain("s1").unwrap();
        project.add_to_strain(strain, Readable::Pair(pair)).unwrap();
        assert!(project.pair(pair).alignment.diffs(&project).is_empty());
        assert_eq!(project.strain_summary(strain).diffs, 0);

        let diffs = vec![snv(&project, 25, 5)];
        project.set_read_diffs(r2, diffs);
        assert_eq!(project.pair(pair).alignment.diffs(&project).len(), 1);
        assert_eq!(project.strain_summary(strain).diffs, 1);
    }

    #[test]
    fn substitution_touches_only_overlapping_reads() {
        let mut project = project();
        let a = add(&mut project, "a", 90, 110);
        let b = add(&mut project, "b", 1, 50);
        let c = add(&mut project, "c", 120, 150);
        let d = add(&mut project, "d", 60, 80);
        let pair = project.pair_reads("ad", d, a).unwrap();
        let s1 = project.add_strain("s1").unwrap();
        let s2 = project.add_strain("s2").unwrap();
        project.add_to_strain(s1, Readable::Pair(pair)).unwrap();
        project.add_to_strain(s2, Readable::Read(b)).unwrap();
        project.add_to_strain(s2, Readable::Read(c)).unwrap();

        // Reference base at 100 is T
        let edit = ReferenceEdit::new(100, b'G', b'T');
        let summary = project.edit_reference(edit, &EditScope::All).unwrap();
        assert_eq!(summary.reads, vec![a]);
        assert_eq!(summary.pairs, vec![pair]);
        assert_eq!(summary.strains, vec![s1]);

        assert_eq!(project.reference().base(100), b'G');
        assert_eq!(
            project.read(a).alignment.diffs(&project),
            &[Difference::new(100, b'G', 11, b'T')]
        );
        assert_eq!(project.read(a).alignment.base(11, &project), b'T');
        assert!(project.read(b).alignment.diffs(&project).is_empty());
        assert!(project.read(c).alignment.diffs(&project).is_empty());
        assert_eq!(project.strain_consensus(s1, false).unwrap()[100 - 60], b'T');
    }

    #[test]
    fn mismatched_edit_is_rejected_untouched() {
        let mut project = project();
        let a = add(&mut project, "a", 90, 110);
        let edit = ReferenceEdit::new(100, b'G', b'A');
        assert!(project.edit_reference(edit, &EditScope::All).is_err());
        assert_eq!(project.reference().base(100), b'T');
        assert!(project.read(a).alignment.diffs(&project).is_empty());
    }

    #[test]
    fn insertion_shifts_reads_above_and_keeps_sequences() {
        let mut project = project();
        let a = add(&mut project, "a", 90, 110);
        let c = add(&mut project, "c", 120, 150);
        let b = add(&mut project, "b", 1, 50);
        let strain = project.add_strain("s1").unwrap();
        project
            .set_strain_members(strain, vec![Readable::Read(a), Readable::Read(c)])
            .unwrap();
        let before = project.strain_consensus(strain, false).unwrap();
        let read_before = project.read(a).alignment.sequence(false, &project);

        let edit = ReferenceEdit::new(95, b'G', GAP);
        let summary = project.edit_reference(edit, &EditScope::All).unwrap();
        assert_eq!(summary.reads, vec![a, c]);
        assert_eq!(summary.strains, vec![strain]);

        assert_eq!(project.reference().len(), 201);
        assert_eq!(
            project.read(a).alignment.reference_segment(),
            Segment::on_reference(90, 111)
        );
        assert_eq!(
            project.read(c).alignment.reference_segment(),
            Segment::on_reference(121, 151)
        );
        assert_eq!(
            project.read(b).alignment.reference_segment(),
            Segment::on_reference(1, 50)
        );
        assert_eq!(project.read(a).alignment.sequence(false, &project), read_before);
        assert_eq!(project.strain_consensus(strain, false).unwrap(), before);
    }

    #[test]
    fn reads_outside_scope_adopt_the_edit() {
        let mut project = project();
        let a = add(&mut project, "a", 90, 110);
        let b = add(&mut project, "b", 80, 100);
        let before = project.read(a).alignment.sequence(false, &project);

        let scope = project.scope_for(&[Readable::Read(b)]);
        let edit = ReferenceEdit::new(95, GAP, project.reference().base(95));
        project.edit_reference(edit, &scope).unwrap();

        let after = project.read(a).alignment.sequence(false, &project);
        assert_eq!(after.len(), before.len() - 1);
        assert!(project.read(a).alignment.diffs(&project).is_empty());
        assert_eq!(project.read(b).alignment.diffs(&project).len(), 1);
        assert_eq!(project.read(b).alignment.sequence(false, &project).len(), 21);
    }

    #[test]
    fn deleting_last_reference_base_of_reads_keeps_consensus_consistent() {
        let mut project = project();
        let variant = snv(&project, 5, 5);
        let a = project
            .add_read("a", Segment::on_reference(1, 20), 1, true, vec![variant])
            .unwrap();
        let b = project
            .add_read("b", Segment::on_reference(1, 20), 1, true, vec![variant])
            .unwrap();
        let strain = project.add_strain("s1").unwrap();
        project
            .set_strain_members(strain, vec![Readable::Read(a), Readable::Read(b)])
            .unwrap();

        let edit = ReferenceEdit::new(20, GAP, project.reference().base(20));
        project.edit_reference(edit, &EditScope::All).unwrap();

        for id in [a, b] {
            let alignment = &project.read(id).alignment;
            assert_eq!(alignment.reference_segment(), Segment::on_reference(1, 19));
            assert!(alignment.diffs(&project).iter().all(|d| d.position1 <= 19));
            assert_eq!(alignment.sequence(false, &project).len(), 19);
        }
        let summary = project.strain_summary(strain);
        assert_eq!(summary.span, Some(Segment::on_reference(1, 19)));
        assert_eq!(summary.diffs, 1);
    }

    #[test]
    fn deleting_the_only_base_of_a_read_is_rejected_untouched() {
        let mut project = project();
        let a = add(&mut project, "a", 1, 20);
        let short = add(&mut project, "short", 10, 10);
        let reference_base = project.reference().base(10);
        let edit = ReferenceEdit::new(10, GAP, reference_base);

        assert_eq!(
            project.edit_reference(edit, &EditScope::All).map(|_| ()),
            Err(StrainError::EmptiedAlignment { position: 10 })
        );
        assert_eq!(project.reference().len(), 200);
        assert_eq!(project.reference().base(10), reference_base);
        assert_eq!(
            project.read(a).alignment.reference_segment(),
            Segment::on_reference(1, 20)
        );
        assert_eq!(
            project.read(short).alignment.reference_segment(),
            Segment::on_reference(10, 10)
        );
    }
}
