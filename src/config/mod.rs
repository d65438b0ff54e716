//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and loading
//! - [`defaults`]: serde default values
//! - [`validation`]: startup checks

mod defaults;
mod types;
mod validation;

pub use types::{Config, LogFormat};
pub use validation::validate;
