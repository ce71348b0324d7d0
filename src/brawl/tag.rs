use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters Supercell uses in player and club tags.
pub const TAG_ALPHABET: &str = "0289PYLQGRJCUV";

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("tag is empty")]
    Empty,
    #[error("tag must be {MIN_LEN}-{MAX_LEN} characters long, got {0}")]
    Length(usize),
    #[error("tag contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A normalized Brawl Stars player or club tag.
///
/// Stored without the leading `#`, uppercased; displayed as `#TAG`.
/// The letter `O` is accepted as a typo for `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BrawlTag(String);

impl BrawlTag {
    pub fn parse(raw: &str) -> Result<Self, TagError> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(TagError::Empty);
        }

        let normalized: String = body
            .chars()
            .map(|c| match c.to_ascii_uppercase() {
                'O' => '0',
                upper => upper,
            })
            .collect();

        if let Some(bad) = normalized.chars().find(|c| !TAG_ALPHABET.contains(*c)) {
            return Err(TagError::InvalidChar(bad));
        }
        let len = normalized.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(TagError::Length(len));
        }

        Ok(Self(normalized))
    }

    /// The tag without its `#` prefix.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag as an URL path segment (`%23TAG`).
    pub fn url_encoded(&self) -> String {
        format!("%23{}", self.0)
    }
}

impl fmt::Display for BrawlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for BrawlTag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BrawlTag {
    type Error = TagError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BrawlTag> for String {
    fn from(tag: BrawlTag) -> Self {
        tag.to_string()
    }
}
