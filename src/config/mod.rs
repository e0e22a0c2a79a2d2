//! Configuration module
//!
//! Handles user configuration (`<config dir>/gitwrapper/config.toml`),
//! layered with `GITWRAPPER_*` environment variables.

mod settings;

pub use settings::*;
