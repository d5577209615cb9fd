mod alignment;
mod clone;
mod coverage;
mod diff_index;
mod difference;
mod edit;
mod error;
mod segment;
mod strain;

pub use alignment::{Alignment, AlignmentKind, AlignmentSource};
pub use clone::{mate_gap, mate_pair_span, merge_mate_diffs};
pub use coverage::{find_unknown_regions, CoverageTracker};
pub use diff_index::DiffIndex;
pub use difference::{Difference, FILLER, GAP};
pub use edit::{edit_alignment, EditedAlignment, ReferenceEdit};
pub use error::StrainError;
pub use segment::{CloneId, ReadId, Segment, SequenceRef, StrainId};
pub use strain::{consensus_diffs, strain_span, strain_unknown_regions};
