//! Integration test common infrastructure.
//!
//! Provides utilities for spawning test rooms and connecting test peers.

pub mod client;
pub mod server;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

/// A well-formed ed25519 identity built from one repeated key byte.
pub fn identity(byte: u8) -> String {
    format!("@{}.ed25519", STANDARD.encode([byte; 32]))
}
