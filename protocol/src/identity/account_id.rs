//! # Account Identifiers
//!
//! Human-readable, hierarchical account names such as `donations.factory.near`.
//! An account id is a sequence of `.`-separated segments; each segment is made
//! of lowercase ASCII letters and digits, optionally joined by single `-` or
//! `_` separators:
//!
//! ```text
//! donations.factory.near
//! └───┬───┘ └────┬─────┘
//!  segment     parent
//! ```
//!
//! The parent of an account is the id with its first segment stripped. A
//! top-level id (no `.`) has no parent. The escrow contract forwards its
//! platform fee to its parent, which is the factory that deployed it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MAX_ACCOUNT_ID_LEN, MIN_ACCOUNT_ID_LEN};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons an account id string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountIdError {
    /// Shorter than [`MIN_ACCOUNT_ID_LEN`].
    #[error("account id '{0}' is too short (minimum {min} characters)", min = MIN_ACCOUNT_ID_LEN)]
    TooShort(String),

    /// Longer than [`MAX_ACCOUNT_ID_LEN`].
    #[error("account id is too long: {len} characters (maximum {max})", max = MAX_ACCOUNT_ID_LEN)]
    TooLong {
        /// Length of the rejected input.
        len: usize,
    },

    /// Contains a character outside `[a-z0-9._-]`.
    #[error("account id '{id}' contains invalid character {ch:?} at position {pos}")]
    InvalidChar {
        /// The rejected input.
        id: String,
        /// The offending character.
        ch: char,
        /// Byte offset of the character.
        pos: usize,
    },

    /// Starts or ends with a separator, or has two separators in a row.
    #[error("account id '{0}' has a misplaced separator")]
    MisplacedSeparator(String),
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A validated account identifier.
///
/// Construction always goes through [`AccountId::new`] (or `FromStr` /
/// `TryFrom<String>` / serde), so holding an `AccountId` means holding a
/// syntactically valid one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validates `id` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns an [`AccountIdError`] describing the first rule the input breaks.
    pub fn new(id: impl Into<String>) -> Result<Self, AccountIdError> {
        let id = id.into();
        validate(&id)?;
        Ok(Self(id))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id has no parent (no `.` in it).
    pub fn is_top_level(&self) -> bool {
        !self.0.contains('.')
    }

    /// The parent account: this id with its first segment stripped.
    ///
    /// `donations.factory.near` → `factory.near`; `near` → `None`.
    pub fn parent(&self) -> Option<AccountId> {
        let (_, rest) = self.0.split_once('.')?;
        // Every suffix of a valid id that starts after a '.' is itself valid,
        // except that it may be shorter than the minimum length.
        AccountId::new(rest).ok()
    }
}

fn is_separator(ch: char) -> bool {
    matches!(ch, '.' | '-' | '_')
}

fn validate(id: &str) -> Result<(), AccountIdError> {
    if id.len() < MIN_ACCOUNT_ID_LEN {
        return Err(AccountIdError::TooShort(id.to_string()));
    }
    if id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(AccountIdError::TooLong { len: id.len() });
    }

    let mut last_was_separator = true;
    for (pos, ch) in id.char_indices() {
        if is_separator(ch) {
            if last_was_separator {
                return Err(AccountIdError::MisplacedSeparator(id.to_string()));
            }
            last_was_separator = true;
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            last_was_separator = false;
        } else {
            return Err(AccountIdError::InvalidChar {
                id: id.to_string(),
                ch,
                pos,
            });
        }
    }

    if last_was_separator {
        return Err(AccountIdError::MisplacedSeparator(id.to_string()));
    }

    Ok(())
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId::new(s)
    }
}

impl TryFrom<String> for AccountId {
    type Error = AccountIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AccountId::new(value)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = AccountIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        AccountId::new(value)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn accepts_well_formed_ids() {
        for s in [
            "aa",
            "alice.near",
            "donations.factory.near",
            "a-b_c.d1",
            "0xdeadbeef",
            "system",
        ] {
            assert!(AccountId::new(s).is_ok(), "{s} should be valid");
        }
    }

    #[test]
    fn rejects_bad_length() {
        assert!(matches!(AccountId::new("a"), Err(AccountIdError::TooShort(_))));
        assert!(matches!(AccountId::new(""), Err(AccountIdError::TooShort(_))));
        let long = "a".repeat(MAX_ACCOUNT_ID_LEN + 1);
        assert!(matches!(
            AccountId::new(long),
            Err(AccountIdError::TooLong { len }) if len == MAX_ACCOUNT_ID_LEN + 1
        ));
        assert!(AccountId::new("a".repeat(MAX_ACCOUNT_ID_LEN)).is_ok());
    }

    #[test]
    fn rejects_invalid_characters() {
        let err = AccountId::new("Alice.near").unwrap_err();
        assert_eq!(
            err,
            AccountIdError::InvalidChar {
                id: "Alice.near".into(),
                ch: 'A',
                pos: 0
            }
        );
        assert!(AccountId::new("bob near").is_err());
        assert!(AccountId::new("bob@near").is_err());
    }

    #[test]
    fn rejects_misplaced_separators() {
        for s in [".near", "near.", "a..b", "a-.b", "_ab", "ab-", "a__b"] {
            assert!(
                matches!(AccountId::new(s), Err(AccountIdError::MisplacedSeparator(_))),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn parent_strips_first_segment() {
        assert_eq!(id("donations.factory.near").parent(), Some(id("factory.near")));
        assert_eq!(id("factory.near").parent(), Some(id("near")));
        assert_eq!(id("near").parent(), None);
        assert!(id("near").is_top_level());
        // A one-character suffix is too short to be an account of its own.
        assert_eq!(id("ab.c").parent(), None);
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: AccountId = serde_json::from_str("\"alice.near\"").unwrap();
        assert_eq!(ok.as_str(), "alice.near");
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"alice.near\"");

        let bad: Result<AccountId, _> = serde_json::from_str("\"Alice\"");
        assert!(bad.is_err());
    }
}
