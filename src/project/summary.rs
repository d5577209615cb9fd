use crate::align::{CloneId, ReadId, ReferenceEdit, Segment, StrainId};
use std::collections::HashSet;

/// Which reads keep their own sequence through a reference edit. Reads
/// outside the scope take on the edited reference base.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditScope {
    #[default]
    All,
    Reads(HashSet<ReadId>),
}

impl EditScope {
    pub fn preserves(&self, read: ReadId) -> bool {
        match self {
            EditScope::All => true,
            EditScope::Reads(reads) => reads.contains(&read),
        }
    }
}

/// Everything a reference edit touched.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSummary {
    pub edit: ReferenceEdit,
    pub reads: Vec<ReadId>,
    pub pairs: Vec<CloneId>,
    pub strains: Vec<StrainId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrainSummary {
    pub name: String,
    pub members: usize,
    pub reads: usize,
    pub span: Option<Segment>,
    pub identity: Option<f64>,
    pub diffs: usize,
    pub unknown_bases: usize,
}
