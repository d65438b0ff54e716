//! Default value functions for configuration.

use crate::state::PrivacyMode;
use std::net::{Ipv4Addr, SocketAddr};

use super::types::LogFormat;

pub fn default_log_format() -> LogFormat {
    LogFormat::Text
}

// =============================================================================
// Listener Defaults
// =============================================================================

pub fn default_listen_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8008))
}

pub fn default_preamble_timeout() -> u64 {
    5
}

// =============================================================================
// Storage and Room Defaults
// =============================================================================

pub fn default_db_path() -> String {
    "roomd.db".to_string()
}

pub fn default_privacy_mode() -> PrivacyMode {
    PrivacyMode::Community
}
