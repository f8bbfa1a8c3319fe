use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterviewIdError {
    #[error("interview id cannot be empty")]
    Empty,

    #[error("interview id exceeds 64 characters")]
    TooLong,

    #[error("interview id contains invalid character '{0}'")]
    InvalidChar(char),
}

/// Key of an interview session. Issued by the scheduling service
/// (Mongo ObjectIds, UUIDs, or slugs), so only the character set is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterviewId(String);

impl InterviewId {
    pub fn parse(raw: &str) -> Result<Self, InterviewIdError> {
        if raw.is_empty() {
            return Err(InterviewIdError::Empty);
        }
        if raw.len() > MAX_ID_LEN {
            return Err(InterviewIdError::TooLong);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(InterviewIdError::InvalidChar(c));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InterviewId {
    type Err = InterviewIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InterviewId {
    type Error = InterviewIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InterviewId> for String {
    fn from(id: InterviewId) -> Self {
        id.0
    }
}
