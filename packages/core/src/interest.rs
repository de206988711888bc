//! Interest name validation.

use thiserror::Error;

/// Longest accepted interest name, in characters.
pub const MAX_INTEREST_LENGTH: usize = 164;

/// Most interests a single device may hold.
pub const MAX_INTERESTS: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterestError {
    #[error("interest name must not be empty")]
    Empty,

    #[error("interest '{0}' is longer than {MAX_INTEREST_LENGTH} characters")]
    TooLong(String),

    #[error("interest '{0}' contains characters outside [A-Za-z0-9_-=@,.;]")]
    InvalidCharacters(String),

    #[error("{0} interests exceeds the limit of {MAX_INTERESTS}")]
    TooMany(usize),
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '=' | '@' | ',' | '.' | ';')
}

/// Check a single interest name.
pub fn validate_interest(interest: &str) -> Result<(), InterestError> {
    if interest.is_empty() {
        return Err(InterestError::Empty);
    }
    if interest.chars().count() > MAX_INTEREST_LENGTH {
        return Err(InterestError::TooLong(interest.to_string()));
    }
    if !interest.chars().all(is_allowed) {
        return Err(InterestError::InvalidCharacters(interest.to_string()));
    }
    Ok(())
}

/// Check a whole interest set, including the per-device limit.
pub fn validate_interests<'a, I>(interests: I) -> Result<(), InterestError>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut count = 0;
    for interest in interests {
        validate_interest(interest)?;
        count += 1;
    }
    if count > MAX_INTERESTS {
        return Err(InterestError::TooMany(count));
    }
    Ok(())
}
