use crate::align::{ReferenceEdit, StrainError};

/// The reference sequence all alignments are measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    name: String,
    bases: Vec<u8>,
}

impl Reference {
    pub fn new(name: &str, bases: Vec<u8>) -> Self {
        Reference {
            name: name.to_string(),
            bases,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Base at a 1-based position.
    pub fn base(&self, position: usize) -> u8 {
        assert!(
            (1..=self.bases.len()).contains(&position),
            "Position {} outside reference {} of length {}",
            position,
            self.name,
            self.bases.len()
        );
        self.bases[position - 1]
    }

    pub fn apply(&mut self, edit: &ReferenceEdit) -> Result<(), StrainError> {
        edit.apply_to(&mut self.bases)
    }
}
