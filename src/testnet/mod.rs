//! Test fixtures shared by the unit tests
//!
//! Deterministic proof artifacts, scripted oracles and ready-made chains.

pub mod test_utils;

pub use test_utils::*;
