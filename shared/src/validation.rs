use crate::address::MAX_SEED_LENGTH;

pub const MAX_DESCRIPTION_LENGTH: usize = 280;
pub const MAX_CANDIDATE_NAME_LENGTH: usize = MAX_SEED_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Description exceeds maximum length of {MAX_DESCRIPTION_LENGTH}")]
    DescriptionTooLong,
    #[error("Candidate name exceeds maximum length of {MAX_CANDIDATE_NAME_LENGTH}")]
    CandidateNameTooLong,
    #[error("Empty candidate name")]
    EmptyCandidateName,
    #[error("Poll start ({start}) must be before poll end ({end})")]
    InvalidTimeWindow { start: i64, end: i64 },
}

pub fn validate_poll(description: &str, poll_start: i64, poll_end: i64) -> Result<(), ValidationError> {
    if description.len() > MAX_DESCRIPTION_LENGTH { return Err(ValidationError::DescriptionTooLong); }
    if poll_start >= poll_end {
        return Err(ValidationError::InvalidTimeWindow { start: poll_start, end: poll_end });
    }

    Ok(())
}

/// Must run before the name reaches key derivation.
pub fn validate_candidate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() { return Err(ValidationError::EmptyCandidateName); }
    if name.len() > MAX_CANDIDATE_NAME_LENGTH { return Err(ValidationError::CandidateNameTooLong); }

    Ok(())
}
