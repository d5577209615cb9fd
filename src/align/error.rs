use thiserror::Error;

/// Errors raised by the alignment bookkeeping layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrainError {
    #[error("Name already in use: {0}")]
    DuplicateName(String),

    #[error("Read {read} is already a mate of pair {pair}")]
    AlreadyPaired { read: String, pair: String },

    #[error("Read {read} belongs to pair {pair}; add the pair instead")]
    MateOfPair { read: String, pair: String },

    #[error("Mates {0} and {1} must be distinct reads")]
    SelfPair(String, String),

    #[error("Edit position {position} is outside the reference of length {length}")]
    EditOutOfRange { position: usize, length: usize },

    #[error("Reference base at {position} is {found}, edit expects {expected}")]
    ReferenceMismatch {
        position: usize,
        expected: char,
        found: char,
    },

    #[error("Deleting reference base {position} removes every column of an aligned read")]
    EmptiedAlignment { position: usize },

    #[error("Coverage {coverage} at position {position} is below the {votes} calls seen there")]
    InconsistentCoverage {
        position: usize,
        coverage: usize,
        votes: usize,
    },
}

impl From<StrainError> for String {
    fn from(e: StrainError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_into_application_error() {
        let result: std::result::Result<(), String> =
            Err(StrainError::DuplicateName("r1".to_string()).into());
        assert_eq!(result.unwrap_err(), "Name already in use: r1");
    }
}
