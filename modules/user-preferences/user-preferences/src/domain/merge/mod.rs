//! Structural merge engine for settings patches.

pub mod engine;
pub mod keys;

pub use engine::{MergeOutcome, MergeRules, merge};
pub use keys::{RESERVED_KEYS, is_reserved};
