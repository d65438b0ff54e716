//! Member repository and the role hierarchy.
//!
//! Each member is an identity holding exactly one [`Role`]. Identities are
//! unique across the table; ids are assigned by the store and never reused.

pub mod models;
pub mod queries;

pub use models::{Member, Role};
pub use queries::MemberRepository;
