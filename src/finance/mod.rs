//! Finance module containing statement registration, receivable lifecycle,
//! and the ledger facade

pub mod core;
pub mod receivables;
pub mod statement;

pub use core::*;
pub use receivables::*;
pub use statement::*;
