//! Login identifiers (E.164-like phone numbers).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum number of digits after the leading `+`.
pub const MIN_DIGITS: usize = 10;

/// Maximum number of digits after the leading `+` (E.164 limit).
pub const MAX_DIGITS: usize = 15;

/// Returned when a string does not have the `+` followed by 10–15 digits shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("identifier must be '+' followed by {MIN_DIGITS}-{MAX_DIGITS} digits")]
pub struct InvalidIdentifier;

/// A phone number that passed the basic shape check.
///
/// Only the shape is checked. No normalisation happens, so `+15551234567` and
/// `+1 555 123 4567` are different identifiers (the second one is rejected).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, InvalidIdentifier> {
        let digits = raw.strip_prefix('+').ok_or(InvalidIdentifier)?;
        if !(MIN_DIGITS..=MAX_DIGITS).contains(&digits.len())
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(InvalidIdentifier);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render for logs: only the last four digits stay visible.
    pub fn masked(&self) -> String {
        mask(&self.0)
    }
}

/// Mask any identifier-like string for logging.
pub fn mask(raw: &str) -> String {
    let count = raw.chars().count();
    if count <= 4 {
        return "****".to_owned();
    }
    let tail: String = raw.chars().skip(count - 4).collect();
    format!("****{tail}")
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = InvalidIdentifier;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}
