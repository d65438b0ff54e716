//! Authorization for the room.
//!
//! Two layers, both expressed as a [`PolicyCheck`]:
//!
//! - [`Gate`] runs once per verified connection and picks the handler set
//!   (master for the room's own identity, public for admitted peers), or
//!   rejects the connection. Admission depends on the live privacy mode.
//! - [`AdminPolicy`] runs per admin action and checks the acting
//!   [`Principal`]'s role.

mod admin;
mod connection;
mod gate;
mod policy;

pub use admin::{AdminAction, AdminPolicy, Principal};
pub use gate::Gate;
pub use policy::{PolicyCheck, Verdict};
