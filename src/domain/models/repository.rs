use crate::domain::errors::RepositoryParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySlug {
    pub owner: String,
    pub name: String,
}

impl RepositorySlug {
    /// Parses `owner/name`. Runs before any request is issued, so a bad slug
    /// never reaches the network.
    pub fn parse(input: &str) -> Result<Self, RepositoryParseError> {
        let (owner, name) = input
            .trim()
            .split_once('/')
            .ok_or(RepositoryParseError::MissingSeparator)?;

        if name.contains('/') {
            return Err(RepositoryParseError::TooManySeparators);
        }
        if owner.is_empty() || name.is_empty() {
            return Err(RepositoryParseError::EmptySegment);
        }
        for segment in [owner, name] {
            validate_segment(segment)?;
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

/// Segments are placed verbatim into request paths, so only GitHub's name
/// alphabet is accepted.
fn validate_segment(segment: &str) -> Result<(), RepositoryParseError> {
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(RepositoryParseError::InvalidCharacter);
    }
    if segment == "." || segment == ".." {
        return Err(RepositoryParseError::DotSegment);
    }
    Ok(())
}

impl fmt::Display for RepositorySlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
