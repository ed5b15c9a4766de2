//! Stable per-change identity.
//!
//! Every amend/rebase changes a commit's hash, so change identity is carried
//! out-of-band as a 16-lowercase-hex-character UUID trailer (`PR-UUID`)
//! injected on the first write of each commit. The engine never uses commit
//! hash equality for identity — only this value.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::branch_name::is_uuid16;

/// A validated 16-lowercase-hex-char change identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uuid16(String);

impl Uuid16 {
    /// Generate a fresh identity from 8 cryptographically random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn parse(s: &str) -> Option<Self> {
        if is_uuid16(s) {
            Some(Self(s.to_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uuid16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Uuid16 {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uuid16::parse(&value).ok_or_else(|| format!("'{value}' is not a 16-hex-char UUID"))
    }
}

impl From<Uuid16> for String {
    fn from(value: Uuid16) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_uuids_are_valid_and_unique() {
        let a = Uuid16::generate();
        let b = Uuid16::generate();
        assert!(is_uuid16(a.as_str()));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Uuid16::parse("not-hex").is_none());
        assert!(Uuid16::parse("0123456789abcde").is_none());
        assert!(Uuid16::parse("0123456789abcdef").is_some());
    }

    #[test]
    fn serde_round_trip() {
        let id = Uuid16::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: Uuid16 = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
