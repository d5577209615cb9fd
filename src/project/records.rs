use crate::align::{Alignment, CloneId, ReadId, StrainId};
use std::fmt;

/// Anything that can be placed into a strain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Readable {
    Read(ReadId),
    Pair(CloneId),
}

/// What a project-wide name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedItem {
    Read(ReadId),
    Pair(CloneId),
    Strain(StrainId),
}

impl fmt::Display for Readable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Readable::Read(ReadId(id)) => write!(f, "read#{}", id),
            Readable::Pair(CloneId(id)) => write!(f, "pair#{}", id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Read {
    pub name: String,
    pub alignment: Alignment,
    /// Set when the read is a mate of a pair.
    pub pair: Option<CloneId>,
    /// Strain holding the read directly; mates are held through their pair.
    pub strain: Option<StrainId>,
}

/// Two mates sequenced from the two ends of one clone.
#[derive(Debug, Clone)]
pub struct MatePair {
    pub name: String,
    pub mates: [ReadId; 2],
    pub alignment: Alignment,
    pub strain: Option<StrainId>,
}

#[derive(Debug, Clone)]
pub struct Strain {
    pub name: String,
    pub members: Vec<Readable>,
    /// Consensus alignment; absent while the strain has no members.
    pub alignment: Option<Alignment>,
}

impl Strain {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
