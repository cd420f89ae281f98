//! Chip-type tokens and their normalized comparison form

use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-fold and drop everything that is not an ASCII letter or digit.
///
/// `"XYZ-99"`, `"xyz_99"` and `"xyz 99"` all normalize to `"xyz99"`.
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Strip surrounding whitespace, then any surrounding double and single quotes.
pub(crate) fn trim_token(value: &str) -> &str {
    value
        .trim()
        .trim_matches('"')
        .trim_matches('\'')
}

/// A human-entered chip type together with its cached normalized form.
///
/// Equality is defined on the normalized form, so `ABC-123` and `abc123`
/// name the same chip type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ChipTypeToken {
    raw: String,
    normalized: String,
}

impl ChipTypeToken {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = trim_token(&raw.into()).to_string();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn lowercase(&self) -> String {
        self.raw.to_lowercase()
    }
}

impl PartialEq for ChipTypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for ChipTypeToken {}

impl From<String> for ChipTypeToken {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for ChipTypeToken {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<ChipTypeToken> for String {
    fn from(token: ChipTypeToken) -> Self {
        token.raw
    }
}

impl fmt::Display for ChipTypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
