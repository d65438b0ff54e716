//! Core handler infrastructure: context, trait and dispatch.

mod context;
mod registry;

pub use context::{Context, Handler, arg};
pub use registry::Registry;
