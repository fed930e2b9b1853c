//! Player and club tags.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest and longest tag body (characters after the `#`) we accept.
const MIN_TAG_BODY: usize = 3;
const MAX_TAG_BODY: usize = 15;

static TAG_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Z]+$").expect("tag regex is valid"));

/// Why a tag string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag {input:?}: {reason}")]
pub struct InvalidTag {
    pub input: String,
    pub reason: &'static str,
}

/// A validated, normalized player or club tag (e.g. `#2YJQ8LRCG`).
///
/// Normalization strips whitespace and upper-cases ASCII letters; the leading
/// `#` is mandatory and anything outside ASCII is rejected.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tag(String);

impl Tag {
    /// Parse and normalize a tag.
    pub fn parse(input: &str) -> Result<Self, InvalidTag> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        let reject = |reason| InvalidTag {
            input: input.to_string(),
            reason,
        };

        if normalized.is_empty() {
            return Err(reject("tag is empty"));
        }
        let Some(body) = normalized.strip_prefix('#') else {
            return Err(reject("tag must start with '#'"));
        };
        if !TAG_BODY.is_match(body) {
            return Err(reject("tag may only contain letters and digits after '#'"));
        }
        if !(MIN_TAG_BODY..=MAX_TAG_BODY).contains(&body.len()) {
            return Err(reject("tag must have 3 to 15 characters after '#'"));
        }

        Ok(Self(normalized))
    }

    /// The tag including its leading `#`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compare two raw tags the way the game does: case-insensitive, with or
/// without the leading `#`.
pub fn tags_equal(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.trim().trim_start_matches('#').to_ascii_uppercase();
    strip(a) == strip(b)
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.0)
    }
}

impl FromStr for Tag {
    type Err = InvalidTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Tag {
    type Error = InvalidTag;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Tag> for String {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}
