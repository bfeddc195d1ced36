//! Bank statement reconciliation engine
//!
//! Matches imported bank entries against outstanding receivables in four
//! steps: suggestion (advisory candidate ranking), allocation validation,
//! atomic commit, and snapshot-based reversal.

pub mod allocation;
pub mod engine;
pub mod suggest;

pub use allocation::*;
pub use engine::*;
pub use suggest::*;
