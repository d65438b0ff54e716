//! Connection preamble parser.
//!
//! The handshake front in front of the listener verifies the peer's key and
//! forwards the stream with one leading line naming the verified identity:
//!
//! ```text
//! PEER @<base64 key>.<algo>
//! ```

use crate::identity::{Identity, ParseIdentityError};
use thiserror::Error;

const PREAMBLE_KEYWORD: &str = "PEER";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreambleError {
    #[error("expected `PEER <identity>` preamble")]
    Malformed,
    #[error("invalid peer identity: {0}")]
    Identity(#[from] ParseIdentityError),
}

/// Parse a preamble line into the peer's verified identity.
pub fn parse_preamble(line: &str) -> Result<Identity, PreambleError> {
    let mut parts = line.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(keyword), Some(identity), None) if keyword == PREAMBLE_KEYWORD => {
            Ok(identity.parse()?)
        }
        _ => Err(PreambleError::Malformed),
    }
}
