//! # Clubledger Core
//!
//! Core finance library for a sports club back office, centered on matching
//! imported bank statement lines against outstanding receivables.
//!
//! ## Features
//!
//! - **Statement registration**: normalized bank lines become pending entries
//!   awaiting reconciliation
//! - **Matching suggestions**: deterministic text/amount scoring of overdue
//!   invoices and payers against statement descriptions
//! - **Allocation validation**: over-allocation, duplicate-target, and
//!   positivity rules checked before anything is written
//! - **Atomic reconciliation**: financial entries, state transitions, and
//!   reversal records committed as one transaction
//! - **Clean reversal**: snapshot-based undo restores every touched
//!   receivable and removes everything the commit created
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use clubledger_core::{FinanceLedger, MemoryStore};
//!
//! // The facade works over any LedgerStore implementation
//! let mut ledger = FinanceLedger::new(MemoryStore::new());
//! ```

pub mod finance;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use finance::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use utils::memory_store::MemoryStore;
