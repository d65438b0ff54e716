//! Room privacy mode and the shared handle the gate reads it through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

/// Who may connect to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyMode {
    /// Anyone may connect and anyone may join.
    Open = 1,
    /// Anyone may connect; joining requires an invite from a member.
    Community = 2,
    /// Only members may connect.
    Restricted = 3,
}

/// A raw privacy value that names no mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown privacy mode value {0}")]
pub struct UnknownPrivacyMode(pub u8);

/// Privacy mode text that names no mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid privacy mode: {0:?}")]
pub struct InvalidPrivacyMode(pub String);

impl PrivacyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Community => "community",
            Self::Restricted => "restricted",
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for PrivacyMode {
    type Error = UnknownPrivacyMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Open),
            2 => Ok(Self::Community),
            3 => Ok(Self::Restricted),
            other => Err(UnknownPrivacyMode(other)),
        }
    }
}

impl FromStr for PrivacyMode {
    type Err = InvalidPrivacyMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "community" => Ok(Self::Community),
            "restricted" => Ok(Self::Restricted),
            _ => Err(InvalidPrivacyMode(s.to_string())),
        }
    }
}

impl fmt::Display for PrivacyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to the current privacy mode.
///
/// Clones observe the same value. Reads are lock-free; writers that also
/// persist the mode hold [`PrivacyHandle::lock_writes`] across both steps.
#[derive(Debug, Clone)]
pub struct PrivacyHandle {
    raw: Arc<AtomicU8>,
    writer: Arc<Mutex<()>>,
}

impl PrivacyHandle {
    pub fn new(mode: PrivacyMode) -> Self {
        Self::from_raw(mode.as_u8())
    }

    /// Build a handle from a persisted value without validating it.
    ///
    /// An unknown value is kept as-is and reported by [`PrivacyHandle::load`].
    pub fn from_raw(raw: u8) -> Self {
        Self {
            raw: Arc::new(AtomicU8::new(raw)),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Exclusive right to change the mode until the guard is dropped.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    pub fn load(&self) -> Result<PrivacyMode, UnknownPrivacyMode> {
        PrivacyMode::try_from(self.raw.load(Ordering::Acquire))
    }

    pub fn store(&self, mode: PrivacyMode) {
        self.raw.store(mode.as_u8(), Ordering::Release);
    }
}
