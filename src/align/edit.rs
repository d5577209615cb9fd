//! Single-base reference edits and their effect on one aligned read.

use super::alignment::{Alignment, AlignmentSource};
use super::difference::{Difference, GAP};
use super::error::StrainError;
use super::segment::Segment;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceEdit {
    /// Replace the base at `position`.
    Substitute { position: usize, old: u8, new: u8 },
    /// Insert `base` before `position`; the old base moves to `position + 1`.
    Insert { position: usize, base: u8 },
    /// Remove the base at `position`.
    Delete { position: usize, base: u8 },
}

impl ReferenceEdit {
    /// Builds an edit from the base change at `position`: a gap as the old
    /// base is an insertion, a gap as the new base a deletion.
    pub fn new(position: usize, new_base: u8, old_base: u8) -> Self {
        assert!(position >= 1, "Reference positions are 1-based");
        match (old_base, new_base) {
            (GAP, GAP) => panic!("Edit at {} replaces a gap with a gap", position),
            (GAP, base) => ReferenceEdit::Insert { position, base },
            (base, GAP) => ReferenceEdit::Delete { position, base },
            (old, new) => ReferenceEdit::Substitute { position, old, new },
        }
    }

    /// Parses `POS:OLD>NEW`, for example `120:A>G`, `57:->T` or `88:C>-`.
    pub fn from_string(s: &str) -> Result<Self, String> {
        let malformed = || format!("Invalid edit {}, expected POS:OLD>NEW", s);
        let (position, change) = s.trim().split_once(':').ok_or_else(malformed)?;
        let (old, new) = change.split_once('>').ok_or_else(malformed)?;
        let position: usize = position
            .parse()
            .map_err(|e| format!("Invalid edit position {}: {}", position, e))?;
        let single_base = |b: &str| match b.as_bytes() {
            [base] if *base == GAP || base.is_ascii_alphabetic() => Ok(base.to_ascii_uppercase()),
            _ => Err(format!("Invalid base {:?} in edit {}", b, s)),
        };
        let (old, new) = (single_base(old)?, single_base(new)?);
        if position == 0 {
            return Err(format!("Edit position must be at least 1: {}", s));
        }
        if old == new {
            return Err(format!("Edit {} does not change the reference", s));
        }
        Ok(Self::new(position, new, old))
    }

    pub fn position(&self) -> usize {
        match *self {
            ReferenceEdit::Substitute { position, .. }
            | ReferenceEdit::Insert { position, .. }
            | ReferenceEdit::Delete { position, .. } => position,
        }
    }

    pub fn length_delta(&self) -> i64 {
        match self {
            ReferenceEdit::Substitute { .. } => 0,
            ReferenceEdit::Insert { .. } => 1,
            ReferenceEdit::Delete { .. } => -1,
        }
    }

    /// Applies the edit to 1-based reference `bases`, checking the recorded
    /// old base first.
    pub fn apply_to(&self, bases: &mut Vec<u8>) -> Result<(), StrainError> {
        let position = self.position();
        let limit = match self {
            ReferenceEdit::Insert { .. } => bases.len() + 1,
            _ => bases.len(),
        };
        if position > limit {
            return Err(StrainError::EditOutOfRange {
                position,
                length: bases.len(),
            });
        }
        let check = |expected: u8| {
            let found = bases[position - 1];
            if found.eq_ignore_ascii_case(&expected) {
                Ok(())
            } else {
                Err(StrainError::ReferenceMismatch {
                    position,
                    expected: expected as char,
                    found: found as char,
                })
            }
        };
        match *self {
            ReferenceEdit::Substitute { old, new, .. } => {
                check(old)?;
                bases[position - 1] = new;
            }
            ReferenceEdit::Insert { base, .. } => bases.insert(position - 1, base),
            ReferenceEdit::Delete { base, .. } => {
                check(base)?;
                bases.remove(position - 1);
            }
        }
        Ok(())
    }
}

impl fmt::Display for ReferenceEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (old, new) = match *self {
            ReferenceEdit::Substitute { old, new, .. } => (old, new),
            ReferenceEdit::Insert { base, .. } => (GAP, base),
            ReferenceEdit::Delete { base, .. } => (base, GAP),
        };
        write!(f, "{}:{}>{}", self.position(), old as char, new as char)
    }
}

/// Reference span and differences of an alignment after an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedAlignment {
    pub reference: Segment,
    pub diffs: Vec<Difference>,
}

fn offset(position: usize, delta: i64) -> usize {
    (position as i64 + delta) as usize
}

/// Rewrites a read alignment for `edit`, or returns `None` when the read
/// lies entirely below the edit.
///
/// With `preserve` set the read keeps its own sequence and the differences
/// absorb the edit; otherwise the read takes on the edited reference base.
/// Reads above the edit only move. Deleting the last column of a read clips
/// its final base, and deleting the only column of a read is an error.
pub fn edit_alignment<S: AlignmentSource + ?Sized>(
    alignment: &Alignment,
    edit: &ReferenceEdit,
    preserve: bool,
    src: &S,
) -> Result<Option<EditedAlignment>, StrainError> {
    let span = alignment.reference_segment();
    let position = edit.position();
    let edited = match *edit {
        ReferenceEdit::Substitute { .. } if !span.contains_position(position) => None,
        ReferenceEdit::Insert { .. } | ReferenceEdit::Delete { .. } if span.end < position => None,
        ReferenceEdit::Insert { .. } if span.start >= position => Some(shifted(alignment, 1, src)),
        ReferenceEdit::Delete { .. } if span.start > position => Some(shifted(alignment, -1, src)),
        ReferenceEdit::Substitute { old, new, .. } => {
            Some(substitute(alignment, position, old, new, preserve, src))
        }
        ReferenceEdit::Insert { base, .. } => Some(insert(alignment, position, base, preserve, src)),
        ReferenceEdit::Delete { base, .. } => {
            Some(delete(alignment, position, base, preserve, src)?)
        }
    };
    Ok(edited)
}

fn shifted<S: AlignmentSource + ?Sized>(alignment: &Alignment, delta: i64, src: &S) -> EditedAlignment {
    let span = alignment.reference_segment();
    EditedAlignment {
        reference: Segment::on_reference(offset(span.start, delta), offset(span.end, delta)),
        diffs: alignment
            .diffs(src)
            .iter()
            .map(|d| Difference {
                position1: offset(d.position1, delta),
                ..*d
            })
            .collect(),
    }
}

fn substitute<S: AlignmentSource + ?Sized>(
    alignment: &Alignment,
    position: usize,
    old: u8,
    new: u8,
    preserve: bool,
    src: &S,
) -> EditedAlignment {
    let index = alignment.diff_index(src);
    let mut diffs = index.diffs().to_vec();
    match index.index_at_reference_position(position) {
        Some(i) if diffs[i].base2 == new => {
            diffs.remove(i);
        }
        Some(i) => diffs[i].base1 = new,
        None if preserve => diffs.push(Difference::new(
            position,
            new,
            alignment.pos_from_reference(position, src),
            old,
        )),
        None => {}
    }
    EditedAlignment {
        reference: alignment.reference_segment(),
        diffs,
    }
}

fn insert<S: AlignmentSource + ?Sized>(
    alignment: &Alignment,
    position: usize,
    base: u8,
    preserve: bool,
    src: &S,
) -> EditedAlignment {
    let span = alignment.reference_segment();
    let index = alignment.diff_index(src);
    // Query position of the read base that follows the new reference base
    let query_next = index
        .at_reference_position(position)
        .map(|d| d.position2)
        .unwrap_or_else(|| alignment.pos_from_reference(position, src));
    let inserted = index.insertions_before(position).len();
    let last_insertion = (inserted > 0)
        .then(|| index.diffs().partition_point(|d| d.position1 < position) + inserted - 1);

    let mut diffs: Vec<Difference> = index
        .diffs()
        .iter()
        .map(|d| {
            if d.position1 > position || (d.position1 == position && !d.is_reference_gap()) {
                Difference {
                    position1: d.position1 + 1,
                    position2: if preserve { d.position2 } else { d.position2 + 1 },
                    ..*d
                }
            } else {
                *d
            }
        })
        .collect();

    if preserve {
        match last_insertion {
            // The inserted read base now lines up with the new reference base
            Some(i) if diffs[i].base2 == base => {
                diffs.remove(i);
            }
            Some(i) => diffs[i].base1 = base,
            None => diffs.push(Difference::new(position, base, query_next, GAP)),
        }
    }

    EditedAlignment {
        reference: Segment::on_reference(span.start, span.end + 1),
        diffs,
    }
}

fn delete<S: AlignmentSource + ?Sized>(
    alignment: &Alignment,
    position: usize,
    base: u8,
    preserve: bool,
    src: &S,
) -> Result<EditedAlignment, StrainError> {
    let span = alignment.reference_segment();
    if span.len() == 1 {
        return Err(StrainError::EmptiedAlignment { position });
    }
    let index = alignment.diff_index(src);
    let at = index.index_at_reference_position(position);
    let read_had_gap = at.is_some_and(|i| index.diffs()[i].is_query_gap());

    let mut diffs = Vec::with_capacity(index.len() + 1);
    for (i, d) in index.diffs().iter().enumerate() {
        if Some(i) == at {
            // A read base over the deleted column becomes inserted
            if preserve && !d.is_query_gap() {
                diffs.push(Difference {
                    base1: GAP,
                    ..*d
                });
            }
        } else if d.position1 > position {
            let position2 = if preserve || read_had_gap {
                d.position2
            } else {
                d.position2 - 1
            };
            diffs.push(Difference {
                position1: d.position1 - 1,
                position2,
                ..*d
            });
        } else {
            diffs.push(*d);
        }
    }
    if preserve && at.is_none() {
        diffs.push(Difference::new(
            position,
            GAP,
            alignment.pos_from_reference(position, src),
            base,
        ));
    }

    let end = span.end - 1;
    // Read bases past the new end have no column left to sit before
    diffs.retain(|d| d.position1 <= end);
    Ok(EditedAlignment {
        reference: Segment::on_reference(span.start, end),
        diffs,
    })
}
