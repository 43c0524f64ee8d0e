//! Error types for the lending engine
//!
//! Precondition errors are expected business-rule rejections, reported
//! synchronously and never retried. Consistency errors are unexpected;
//! they go to the operator channel and the detecting operation still
//! completes with the safest available action.

use crate::types::{BranchId, MemberId, StockKey, TitleId};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// Result type for lending operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stock ledger errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// No stock record exists for this (title, branch) pair
    #[error("no stock record for title {title_id} at branch {branch_id}")]
    NotFound {
        /// Title
        title_id: TitleId,
        /// Branch
        branch_id: BranchId,
    },

    /// All copies are out on loan
    #[error("no copy of title {title_id} available at branch {branch_id}")]
    Unavailable {
        /// Title
        title_id: TitleId,
        /// Branch
        branch_id: BranchId,
    },

    /// Counter invariant would be violated; signals a bug upstream
    #[error("inconsistent stock for {key}: {detail}")]
    Inconsistent {
        /// Affected record
        key: StockKey,
        /// What went wrong
        detail: String,
    },
}

/// Loan state machine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    /// Member unknown or not ACTIVE
    #[error("member {0} is not eligible to borrow")]
    MemberIneligible(MemberId),

    /// Member already holds the maximum number of active loans
    #[error("member {member_id} has reached the borrowing limit of {limit}")]
    LimitReached {
        /// Member
        member_id: MemberId,
        /// Configured per-member limit
        limit: u32,
    },

    /// No copy to reserve at the requested branch
    #[error("no copy available for title {title_id} at branch {branch_id}")]
    NoCopyAvailable {
        /// Title
        title_id: TitleId,
        /// Branch
        branch_id: BranchId,
    },

    /// Loan id unknown
    #[error("loan not found: {0}")]
    NotFound(Uuid),

    /// Idempotence guard: the loan is already closed
    #[error("loan {0} has already been returned")]
    AlreadyReturned(Uuid),
}

/// Payment reconciliation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Loan id unknown
    #[error("loan not found: {0}")]
    NotFound(Uuid),

    /// The loan has no unpaid fine (also the exactly-once guard)
    #[error("nothing due on loan {0}")]
    NothingDue(Uuid),

    /// Exact-amount payment only; no partial or overpayment
    #[error("payment of {got} does not match fine of {expected} on loan {loan_id}")]
    AmountMismatch {
        /// Loan
        loan_id: Uuid,
        /// Assessed fine
        expected: Decimal,
        /// Amount tendered
        got: Decimal,
    },
}

/// Umbrella error reported by the service façade
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Loan state machine rejection
    #[error(transparent)]
    Loan(#[from] LoanError),

    /// Payment reconciliation rejection
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Stock ledger rejection (admin operations)
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True for expected business-rule rejections
    ///
    /// Everything that is not a precondition error is a consistency or
    /// configuration problem and belongs on the operator channel.
    pub fn is_precondition(&self) -> bool {
        !matches!(
            self,
            Error::Stock(StockError::Inconsistent { .. }) | Error::Config(_)
        )
    }

    /// HTTP status for the external request layer
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Loan(LoanError::MemberIneligible(_))
            | Error::Loan(LoanError::LimitReached { .. }) => 403,
            Error::Loan(LoanError::NotFound(_))
            | Error::Payment(PaymentError::NotFound(_))
            | Error::Stock(StockError::NotFound { .. }) => 404,
            Error::Loan(LoanError::NoCopyAvailable { .. })
            | Error::Loan(LoanError::AlreadyReturned(_))
            | Error::Payment(PaymentError::NothingDue(_))
            | Error::Payment(PaymentError::AmountMismatch { .. }) => 409,
            Error::Stock(StockError::Unavailable { .. }) => 409,
            Error::Stock(StockError::Inconsistent { .. }) | Error::Config(_) => 500,
        }
    }
}
