//! Network module.
//!
//! Contains the Gateway (TCP listener), the per-peer Connection handler, and
//! the preamble parser.

mod connection;
mod gateway;
mod preamble;

pub use connection::Connection;
pub use gateway::Gateway;
