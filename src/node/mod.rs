//! The caller-facing node: genesis, transaction creation, mining and reads

pub mod node;

pub use node::{Node, GENESIS_ORIGIN};
