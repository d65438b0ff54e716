//! Peer identities.
//!
//! An [`Identity`] is the verified public key of a peer together with the
//! algorithm tag of its feed format. The canonical text form is
//! `@<base64 key>.<algo>`, e.g. `@x7iOLUcq3o+sjGeAnipvWeGzfuYgrXl8L4LYlxIhwDc=.ed25519`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Length of a peer public key in bytes.
pub const KEY_LEN: usize = 32;

/// Errors produced while parsing the text form of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIdentityError {
    #[error("identity must start with '@'")]
    MissingSigil,
    #[error("identity has no algorithm suffix")]
    MissingAlgorithm,
    #[error("unknown identity algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("invalid base64 in identity: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("identity key must be {KEY_LEN} bytes, got {0}")]
    KeyLength(usize),
}

/// Feed format of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Ed25519,
    GabbyGrove,
    BendyButt,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::GabbyGrove => "ggfeed-v1",
            Self::BendyButt => "bendybutt-v1",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ed25519" => Ok(Self::Ed25519),
            "ggfeed-v1" => Ok(Self::GabbyGrove),
            "bendybutt-v1" => Ok(Self::BendyButt),
            other => Err(ParseIdentityError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A verified peer identity. Immutable once created.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    key: [u8; KEY_LEN],
    algo: Algorithm,
}

impl Identity {
    pub fn new(key: [u8; KEY_LEN], algo: Algorithm) -> Self {
        Self { key, algo }
    }

    /// Compare two identities without short-circuiting on the key bytes.
    pub fn ct_eq(&self, other: &Identity) -> bool {
        let keys_match: bool = self.key.ct_eq(&other.key).into();
        keys_match && self.algo == other.algo
    }
}

impl FromStr for Identity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('@').ok_or(ParseIdentityError::MissingSigil)?;
        let (encoded, algo) = rest
            .rsplit_once('.')
            .ok_or(ParseIdentityError::MissingAlgorithm)?;
        let algo: Algorithm = algo.parse()?;

        let bytes = STANDARD.decode(encoded)?;
        let key: [u8; KEY_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseIdentityError::KeyLength(bytes.len()))?;

        Ok(Self { key, algo })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}.{}", STANDARD.encode(self.key), self.algo.as_str())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "@x7iOLUcq3o+sjGeAnipvWeGzfuYgrXl8L4LYlxIhwDc=.ed25519";

    #[test]
    fn test_parse_canonical_ref() {
        let id: Identity = ALICE.parse().unwrap();
        assert_eq!(id.algo, Algorithm::Ed25519);
        assert_eq!(id.to_string(), ALICE);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            "x7iOLUcq3o+sjGeAnipvWeGzfuYgrXl8L4LYlxIhwDc=.ed25519".parse::<Identity>(),
            Err(ParseIdentityError::MissingSigil)
        );
        assert_eq!(
            "@x7iOLUcq3o".parse::<Identity>(),
            Err(ParseIdentityError::MissingAlgorithm)
        );
        assert_eq!(
            "@x7iOLUcq3o+sjGeAnipvWeGzfuYgrXl8L4LYlxIhwDc=.rsa".parse::<Identity>(),
            Err(ParseIdentityError::UnknownAlgorithm("rsa".to_string()))
        );
        assert_eq!(
            "@AAAA.ed25519".parse::<Identity>(),
            Err(ParseIdentityError::KeyLength(3))
        );
        assert!(matches!(
            "@not base64!.ed25519".parse::<Identity>(),
            Err(ParseIdentityError::Base64(_))
        ));
    }

    #[test]
    fn test_equality_covers_key_and_algorithm() {
        let a = Identity::new([7; KEY_LEN], Algorithm::Ed25519);
        let b = Identity::new([7; KEY_LEN], Algorithm::GabbyGrove);
        let c = Identity::new([8; KEY_LEN], Algorithm::Ed25519);

        assert_eq!(a, a.clone());
        assert!(a.ct_eq(&a.clone()));
        assert_ne!(a, b);
        assert!(!a.ct_eq(&b));
        assert_ne!(a, c);
        assert!(!a.ct_eq(&c));
    }

    #[test]
    fn test_serde_uses_text_form() {
        let id: Identity = ALICE.parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{ALICE}\""));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
