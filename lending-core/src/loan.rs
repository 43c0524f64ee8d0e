//! Loan state machine
//!
//! One loan runs Active → Returned; "overdue" is a query-time
//! classification of Active loans past due, never a stored transition.
//! Loans are append-only history and are never deleted.
//!
//! Concurrency: each loan is serialized on its own map entry, which
//! makes the `AlreadyReturned` idempotence guard race-free. The
//! per-member active-loan slot count is likewise serialized on the
//! member's entry so that two concurrent opens cannot both slip past
//! the borrowing limit. Lock order is member slot → stock key on open
//! and loan → member slot → stock key on close; the orders never form
//! a cycle.

use crate::catalog::StockLedger;
use crate::error::{LoanError, StockError};
use crate::fine;
use crate::member::{Member, MemberStatus};
use crate::types::{BranchId, FineStatus, Loan, LoanDisplayStatus, LoanStatus, MemberId, TitleId};
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Filter for the read-only loan query surface
#[derive(Debug, Clone, Default)]
pub struct LoanFilter {
    /// Restrict to one member
    pub member_id: Option<MemberId>,

    /// Restrict to one branch
    pub branch_id: Option<BranchId>,

    /// Restrict to one title
    pub title_id: Option<TitleId>,

    /// Restrict to one display classification
    pub status: Option<LoanDisplayStatus>,
}

/// Result of closing a loan
///
/// A stock inconsistency during the release does not undo the return;
/// the loan stays Returned and the error is surfaced for the operator.
#[derive(Debug, Clone)]
pub struct CloseOutcome {
    /// The closed loan
    pub loan: Loan,

    /// Consistency error from the copy release, if any
    pub stock_error: Option<StockError>,
}

/// Loan store and state machine
#[derive(Debug, Default)]
pub struct LoanBook {
    loans: DashMap<Uuid, Loan>,
    active_slots: DashMap<MemberId, u32>,
}

impl LoanBook {
    /// Create empty loan book
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a loan
    ///
    /// Preconditions, checked in order: member must be Active; the
    /// member's active-loan count must be below `limit`; a copy must be
    /// reservable at the branch. A failed precondition leaves no state
    /// behind.
    pub fn open(
        &self,
        member: &Member,
        title_id: &TitleId,
        branch_id: &BranchId,
        stock: &StockLedger,
        loan_period_days: i64,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Loan, LoanError> {
        if member.status != MemberStatus::Active {
            return Err(LoanError::MemberIneligible(member.id.clone()));
        }

        // Hold the member's slot entry across the reservation so two
        // concurrent opens cannot both pass the limit check.
        let mut slot = self.active_slots.entry(member.id.clone()).or_insert(0);
        if *slot >= limit {
            return Err(LoanError::LimitReached {
                member_id: member.id.clone(),
                limit,
            });
        }

        stock
            .reserve_copy(title_id, branch_id)
            .map_err(|_| LoanError::NoCopyAvailable {
                title_id: title_id.clone(),
                branch_id: branch_id.clone(),
            })?;
        *slot += 1;
        drop(slot);

        let loan = Loan {
            id: Uuid::now_v7(),
            member_id: member.id.clone(),
            title_id: title_id.clone(),
            branch_id: branch_id.clone(),
            borrowed_at: now,
            due_at: now + Duration::days(loan_period_days),
            returned_at: None,
            status: LoanStatus::Active,
            fine_amount: None,
            fine_status: FineStatus::None,
        };
        self.loans.insert(loan.id, loan.clone());

        tracing::debug!(
            loan = %loan.id,
            member = %loan.member_id,
            title = %loan.title_id,
            branch = %loan.branch_id,
            due = %loan.due_at,
            "loan opened"
        );
        Ok(loan)
    }

    /// Close a loan
    ///
    /// Sets `returned_at` and Returned status, assesses the fine, then
    /// releases the copy. The release happens even for a late return;
    /// lateness affects fines, never stock. If the release reports an
    /// inconsistency the return is NOT rolled back: the copy was
    /// physically handed back, so the loan stays Returned and the error
    /// goes to the operator channel via the outcome.
    pub fn close(
        &self,
        loan_id: Uuid,
        stock: &StockLedger,
        rate_per_day: Decimal,
        now: DateTime<Utc>,
    ) -> Result<CloseOutcome, LoanError> {
        let loan = {
            let mut entry = self
                .loans
                .get_mut(&loan_id)
                .ok_or(LoanError::NotFound(loan_id))?;

            if entry.status == LoanStatus::Returned {
                return Err(LoanError::AlreadyReturned(loan_id));
            }

            entry.returned_at = Some(now);
            entry.status = LoanStatus::Returned;

            let fine = fine::fine_for(entry.due_at, now, rate_per_day);
            if fine > Decimal::ZERO {
                entry.fine_amount = Some(fine);
                entry.fine_status = FineStatus::Unpaid;
            } else {
                entry.fine_status = FineStatus::None;
            }

            entry.clone()
        };

        if let Some(mut slot) = self.active_slots.get_mut(&loan.member_id) {
            *slot = slot.saturating_sub(1);
        }

        let stock_error = match stock.release_copy(&loan.title_id, &loan.branch_id) {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    loan = %loan.id,
                    title = %loan.title_id,
                    branch = %loan.branch_id,
                    error = %e,
                    "copy release failed after return; loan stays returned"
                );
                Some(e)
            }
        };

        tracing::debug!(
            loan = %loan.id,
            fine = ?loan.fine_amount,
            "loan returned"
        );
        Ok(CloseOutcome { loan, stock_error })
    }

    /// Get a loan by id
    pub fn get(&self, loan_id: Uuid) -> Option<Loan> {
        self.loans.get(&loan_id).map(|l| l.clone())
    }

    /// Number of currently-active loans held by a member
    pub fn active_count(&self, member_id: &MemberId) -> u32 {
        self.active_slots.get(member_id).map(|c| *c).unwrap_or(0)
    }

    /// Loans matching a filter, ordered by borrow time
    pub fn list(&self, filter: &LoanFilter, now: DateTime<Utc>) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self
            .loans
            .iter()
            .filter(|l| {
                filter
                    .member_id
                    .as_ref()
                    .map_or(true, |m| &l.member_id == m)
                    && filter
                        .branch_id
                        .as_ref()
                        .map_or(true, |b| &l.branch_id == b)
                    && filter.title_id.as_ref().map_or(true, |t| &l.title_id == t)
                    && filter.status.map_or(true, |s| l.display_status(now) == s)
            })
            .map(|l| l.clone())
            .collect();
        loans.sort_by_key(|l| l.borrowed_at);
        loans
    }

    /// Exclusive access to one loan entry, for the payment reconciler
    pub(crate) fn loan_mut(&self, loan_id: Uuid) -> Option<RefMut<'_, Uuid, Loan>> {
        self.loans.get_mut(&loan_id)
    }
}
