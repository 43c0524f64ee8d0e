//! Core types for the lending engine
//!
//! All types are designed for:
//! - Serde serialization (read-only projections consumed by the dashboard)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for fine amounts)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Member identifier (membership card number or directory id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(String);

impl MemberId {
    /// Create new member ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Title identifier (catalog id, distinct from ISBN)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleId(String);

impl TitleId {
    /// Create new title ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Branch identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(String);

impl BranchId {
    /// Create new branch ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog entry for one title (by ISBN), distinct from its physical copies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Title {
    /// Catalog id
    pub id: TitleId,

    /// ISBN
    pub isbn: String,

    /// Title name
    pub name: String,

    /// Author
    pub author: String,

    /// Publisher
    pub publisher: String,

    /// Publication year
    pub year: u16,

    /// Category/genre
    pub category: String,

    /// Optional description
    pub description: Option<String>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Partial update applied to a catalog entry by an explicit edit
#[derive(Debug, Clone, Default)]
pub struct TitleUpdate {
    /// New title name
    pub name: Option<String>,
    /// New author
    pub author: Option<String>,
    /// New publisher
    pub publisher: Option<String>,
    /// New publication year
    pub year: Option<u16>,
    /// New category
    pub category: Option<String>,
    /// New description
    pub description: Option<String>,
}

/// Key identifying the copies of one title held at one branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockKey {
    /// Title
    pub title_id: TitleId,
    /// Branch
    pub branch_id: BranchId,
}

impl StockKey {
    /// Create new stock key
    pub fn new(title_id: TitleId, branch_id: BranchId) -> Self {
        Self {
            title_id,
            branch_id,
        }
    }
}

impl fmt::Display for StockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.title_id, self.branch_id)
    }
}

/// Copy counts for one (title, branch) pair
///
/// Invariant: `0 <= available_copies <= total_copies`. Mutated only by
/// the stock ledger under per-key mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Copies owned by the branch
    pub total_copies: u32,

    /// Copies currently on the shelf
    pub available_copies: u32,
}

impl StockRecord {
    /// Copies currently out on loan
    pub fn borrowed_copies(&self) -> u32 {
        self.total_copies - self.available_copies
    }
}

/// Persisted loan status
///
/// Only `Active` and `Returned` are ever stored. "Overdue" is a
/// query-time classification of `Active` loans past their due date, so
/// correctness never depends on a background transition having run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// Copy is out with the member
    Active,
    /// Copy has been handed back (terminal)
    Returned,
}

/// Query-time loan classification, as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanDisplayStatus {
    /// Active, not yet due
    Active,
    /// Active and past due
    Overdue,
    /// Returned
    Returned,
}

/// Fine status for one loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineStatus {
    /// No fine was assessed
    None,
    /// Fine assessed, awaiting payment
    Unpaid,
    /// Fine paid
    Paid,
}

/// One borrow-to-return lifecycle for one copy by one member
///
/// Loans are append-only history: never deleted, terminal once Returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Unique loan ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Borrowing member
    pub member_id: MemberId,

    /// Borrowed title
    pub title_id: TitleId,

    /// Branch the copy came from
    pub branch_id: BranchId,

    /// Borrow timestamp
    pub borrowed_at: DateTime<Utc>,

    /// Due date (`borrowed_at + loan_period`)
    pub due_at: DateTime<Utc>,

    /// Return timestamp; set iff status is Returned
    pub returned_at: Option<DateTime<Utc>>,

    /// Persisted status
    pub status: LoanStatus,

    /// Assessed fine; None until computed at return time
    pub fine_amount: Option<Decimal>,

    /// Fine status
    pub fine_status: FineStatus,
}

impl Loan {
    /// True if the loan is still open and past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && now > self.due_at
    }

    /// Classification at query time
    pub fn display_status(&self, now: DateTime<Utc>) -> LoanDisplayStatus {
        match self.status {
            LoanStatus::Returned => LoanDisplayStatus::Returned,
            LoanStatus::Active if now > self.due_at => LoanDisplayStatus::Overdue,
            LoanStatus::Active => LoanDisplayStatus::Active,
        }
    }
}

/// Payment method accepted at the front desk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PaymentMethod {
    /// Cash at the desk
    Cash,
    /// Bank transfer
    BankTransfer,
    /// E-wallet
    EWallet,
    /// Debit card
    DebitCard,
}

impl PaymentMethod {
    /// Stable wire code
    pub fn code(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "tunai",
            PaymentMethod::BankTransfer => "transfer",
            PaymentMethod::EWallet => "ewallet",
            PaymentMethod::DebitCard => "debit",
        }
    }

    /// Parse from wire code
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "tunai" => Some(PaymentMethod::Cash),
            "transfer" => Some(PaymentMethod::BankTransfer),
            "ewallet" => Some(PaymentMethod::EWallet),
            "debit" => Some(PaymentMethod::DebitCard),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Settlement of one fine; immutable once created, at most one per loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment ID (UUIDv7)
    pub id: Uuid,

    /// Loan the payment settles
    pub loan_id: Uuid,

    /// Amount paid (must equal the assessed fine exactly)
    pub amount: Decimal,

    /// Payment timestamp
    pub paid_at: DateTime<Utc>,

    /// Payment method
    pub method: PaymentMethod,
}
