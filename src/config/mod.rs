//! Configuration management
//!
//! Node settings come from built-in defaults, an optional TOML file and
//! `MINICHAIN_*` environment variables, in increasing precedence.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
