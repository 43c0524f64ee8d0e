//! Perpustakaan Lending Core
//!
//! Lending-transaction lifecycle and fine-computation engine for a
//! multi-branch library.
//!
//! # Architecture
//!
//! - **Stock Ledger**: per-branch copy counts, the single source of
//!   truth for availability, serialized per (title, branch) key
//! - **Loan State Machine**: Active → Returned with computed overdue
//!   classification and append-only history
//! - **Fine Calculator**: pure function of due date, date, and rate
//! - **Payment Reconciler**: exact-amount, exactly-once settlement of
//!   assessed fines
//! - **Library Service**: façade composing the above into `borrow`,
//!   `return_loan`, and `pay_fine`, plus the read-only query surface
//!
//! # Invariants
//!
//! - `0 <= available_copies <= total_copies` for every stock record
//! - `returned_at` is set iff a loan's status is Returned
//! - `due_at = borrowed_at + loan_period`
//! - At most one Payment per loan, created only on Unpaid → Paid
//! - Loans are append-only: never modified after Returned, never deleted

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    unused_qualifications
)]

pub mod audit;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod fine;
pub mod loan;
pub mod member;
pub mod metrics;
pub mod payment;
pub mod service;
pub mod sweep;
pub mod types;

// Re-exports
pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use catalog::{Catalog, StockLedger};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, SweepConfig};
pub use error::{Error, LoanError, PaymentError, Result, StockError};
pub use loan::{CloseOutcome, LoanBook, LoanFilter};
pub use member::{InMemoryMemberDirectory, Member, MemberDirectory, MemberRole, MemberStatus};
pub use metrics::Metrics;
pub use payment::PaymentReconciler;
pub use service::{DashboardStats, LibraryService, LoanView, NewTitle, ReturnReceipt};
pub use types::{
    BranchId, FineStatus, Loan, LoanDisplayStatus, LoanStatus, MemberId, Payment, PaymentMethod,
    StockKey, StockRecord, Title, TitleId, TitleUpdate,
};
