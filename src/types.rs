//! Core types and data structures for the club finance system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Payment state of a receivable (invoice or movement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentState {
    /// Issued and awaiting payment
    Pending,
    /// Fully settled
    Paid,
    /// Past its due date and still unpaid
    Overdue,
    /// Partially settled by one or more reconciliations
    Partial,
    /// Cancelled before settlement
    Cancelled,
}

impl PaymentState {
    /// Whether a receivable in this state can still receive allocations
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PaymentState::Pending | PaymentState::Overdue | PaymentState::Partial
        )
    }
}

/// Accounting classification of an amount (receita/despesa)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Money coming into the club
    Income,
    /// Money leaving the club
    Expense,
}

impl Classification {
    /// Natural classification of a signed bank amount
    /// (positive = credit/income, negative = debit/expense)
    pub fn of(amount: &BigDecimal) -> Self {
        if *amount < BigDecimal::from(0) {
            Classification::Expense
        } else {
            Classification::Income
        }
    }
}

/// How a financial entry was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Settled through the bank statement (the reconciliation default)
    BankTransfer,
    Cash,
    Card,
    DirectDebit,
    Other,
}

/// Reference to the payer of a movement: a registered member or a free-text name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayerRef {
    /// A registered member, by user id
    Member(String),
    /// An external party known only by name (sponsor, walk-in buyer)
    Name(String),
}

impl PayerRef {
    /// Member id, when the payer is a registered member
    pub fn member_id(&self) -> Option<&str> {
        match self {
            PayerRef::Member(id) => Some(id),
            PayerRef::Name(_) => None,
        }
    }
}

/// The receivable an allocation item settles against
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationTarget {
    /// A formal club invoice, by id
    Invoice(String),
    /// A generic financial movement, by id
    Movement(String),
}

impl AllocationTarget {
    /// Id of the referenced receivable
    pub fn id(&self) -> &str {
        match self {
            AllocationTarget::Invoice(id) | AllocationTarget::Movement(id) => id,
        }
    }
}

impl std::fmt::Display for AllocationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationTarget::Invoice(id) => write!(f, "invoice '{}'", id),
            AllocationTarget::Movement(id) => write!(f, "movement '{}'", id),
        }
    }
}

/// One normalized line from an imported bank statement file
///
/// Produced by the spreadsheet ingestion layer; this crate only consumes
/// lines that already carry parsed dates and amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Transaction date as reported by the bank
    pub date: NaiveDate,
    /// Free-text description from the statement
    pub description: String,
    /// Signed amount: positive = credit, negative = debit
    pub amount: BigDecimal,
    /// Running balance as reported by the bank, if present
    pub balance: Option<BigDecimal>,
    /// Bank-side reference, if present
    pub reference: Option<String>,
}

impl StatementLine {
    pub fn new(date: NaiveDate, description: String, amount: BigDecimal) -> Self {
        Self {
            date,
            description,
            amount,
            balance: None,
            reference: None,
        }
    }
}

/// One imported bank transaction awaiting (or having completed) reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Club bank account the statement belongs to
    pub account: Option<String>,
    /// Transaction date
    pub date: NaiveDate,
    /// Statement description used for matching
    pub description: String,
    /// Signed amount: positive = credit/income, negative = debit/expense
    pub amount: BigDecimal,
    /// Balance as reported by the bank, if present
    pub balance: Option<BigDecimal>,
    /// Bank-side reference, if present
    pub reference: Option<String>,
    /// Tag of the statement file this line came from
    pub source: Option<String>,
    /// Default cost center classification for this entry
    pub cost_center_id: String,
    /// Whether this entry has been reconciled
    pub reconciled: bool,
    /// Financial entry created by a direct (unallocated) reconciliation
    pub financial_entry_id: Option<String>,
    /// When the entry was imported
    pub created_at: NaiveDateTime,
}

impl BankEntry {
    /// Create a pending entry from a normalized statement line
    pub fn from_line(
        id: String,
        line: StatementLine,
        account: Option<String>,
        source: Option<String>,
        cost_center_id: String,
    ) -> Self {
        Self {
            id,
            account,
            date: line.date,
            description: line.description,
            amount: line.amount,
            balance: line.balance,
            reference: line.reference,
            source,
            cost_center_id,
            reconciled: false,
            financial_entry_id: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Magnitude of the entry amount that an allocation must fit within
    pub fn unsigned_amount(&self) -> BigDecimal {
        self.amount.abs()
    }
}

/// A person that can be matched against statement descriptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payer {
    /// Unique identifier (user id)
    pub id: String,
    /// Full name as registered with the club
    pub name: String,
    /// Club membership number, if assigned
    pub membership_number: Option<String>,
}

impl Payer {
    pub fn new(id: String, name: String, membership_number: Option<String>) -> Self {
        Self {
            id,
            name,
            membership_number,
        }
    }
}

/// A club-issued receivable tied to one payer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier for the invoice
    pub id: String,
    /// The member this invoice was issued to
    pub payer_id: String,
    /// What the invoice is for
    pub description: String,
    /// Total invoiced amount (positive magnitude)
    pub total: BigDecimal,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Current payment state
    pub state: PaymentState,
    /// Receipt number, assigned once settled
    pub receipt_number: Option<String>,
    /// Cost center the invoice belongs to
    pub cost_center_id: String,
    /// When the invoice was created
    pub created_at: NaiveDateTime,
    /// When the invoice was last updated
    pub updated_at: NaiveDateTime,
}

impl Invoice {
    /// Create a new pending invoice
    pub fn new(
        id: String,
        payer_id: String,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            payer_id,
            description,
            total,
            due_date,
            state: PaymentState::Pending,
            receipt_number: None,
            cost_center_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A generic receivable/payable not backed by a formal invoice
/// (merchandise sale, sponsorship, one-off fee)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Unique identifier for the movement
    pub id: String,
    /// Who owes (or is owed), when known
    pub payer: Option<PayerRef>,
    /// What the movement is for
    pub description: String,
    /// Total amount (positive magnitude)
    pub total: BigDecimal,
    /// Expected settlement date
    pub due_date: NaiveDate,
    /// Current payment state
    pub state: PaymentState,
    /// Cost center the movement belongs to
    pub cost_center_id: String,
    /// When the movement was created
    pub created_at: NaiveDateTime,
    /// When the movement was last updated
    pub updated_at: NaiveDateTime,
}

impl Movement {
    /// Create a new pending movement
    pub fn new(
        id: String,
        payer: Option<PayerRef>,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            payer,
            description,
            total,
            due_date,
            state: PaymentState::Pending,
            cost_center_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The committed accounting record produced by reconciling a bank entry
///
/// Created only by the reconciliation committer and deleted only by the
/// unreconciler; never edited in place once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Accounting date (the bank entry's date)
    pub date: NaiveDate,
    /// Description carried over from the bank entry
    pub description: String,
    /// Income or expense
    pub classification: Classification,
    /// Settled amount (positive magnitude)
    pub amount: BigDecimal,
    /// Cost center the entry is booked against
    pub cost_center_id: String,
    /// The member who paid, when known
    pub payer_id: Option<String>,
    /// The receivable this entry settles, when allocated
    pub settles: Option<AllocationTarget>,
    /// The bank entry this record originates from
    pub bank_entry_id: Option<String>,
    /// How the amount was settled
    pub payment_method: PaymentMethod,
    /// When the entry was committed
    pub created_at: NaiveDateTime,
}

/// Audit and reversal record for one settled allocation item
///
/// Captures the receivable's payment state before the reconciliation so the
/// unreconciler can restore it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
    /// Unique identifier for the record
    pub id: String,
    /// The bank entry that was reconciled
    pub bank_entry_id: String,
    /// The financial entry created for this allocation item
    pub financial_entry_id: String,
    /// The receivable the item settled, when one was allocated
    pub target: Option<AllocationTarget>,
    /// The target's payment state before this reconciliation
    pub prior_state: Option<PaymentState>,
    /// When the record was written
    pub created_at: NaiveDateTime,
}

/// Errors that can occur in the finance system
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    /// A direct reconciliation (no allocation) needs a cost center
    #[error("A cost center is required when no allocation is selected")]
    EmptyClassification,
    /// A supplied allocation must be non-empty with positive amounts
    #[error("Allocation must contain at least one item with a positive amount")]
    NoAllocationSelected,
    /// The same receivable appears more than once in an allocation
    #[error("Duplicate allocation target: {0}")]
    DuplicateTarget(String),
    /// The allocation total exceeds the bank entry amount
    #[error("Allocated total {allocated} exceeds bank entry amount {available}")]
    OverAllocation {
        allocated: BigDecimal,
        available: BigDecimal,
    },
    /// The bank entry is already reconciled
    #[error("Bank entry '{0}' is already reconciled")]
    AlreadyReconciled(String),
    /// The bank entry has no reconciliation to reverse
    #[error("Bank entry '{0}' is not reconciled")]
    NotReconciled(String),
    /// The bank entry does not exist
    #[error("Bank entry not found: {0}")]
    EntryNotFound(String),
    /// An allocation target does not exist
    #[error("Allocation target not found: {0}")]
    TargetNotFound(String),
    /// General validation failure
    #[error("Validation error: {0}")]
    Validation(String),
    /// The ledger store failed mid-transaction; nothing was retained
    #[error("Storage error: {0}")]
    Storage(String),
}

impl FinanceError {
    /// Whether this is an allocation validation failure (no side effects)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FinanceError::EmptyClassification
                | FinanceError::NoAllocationSelected
                | FinanceError::DuplicateTarget(_)
                | FinanceError::OverAllocation { .. }
                | FinanceError::Validation(_)
        )
    }

    /// Whether the operation was inapplicable to current state (no side effects)
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            FinanceError::AlreadyReconciled(_)
                | FinanceError::NotReconciled(_)
                | FinanceError::EntryNotFound(_)
                | FinanceError::TargetNotFound(_)
        )
    }
}

/// Result type for finance operations
pub type FinanceResult<T> = Result<T, FinanceError>;
