//! Payment reconciliation
//!
//! Matches a payment to its outstanding fine and clears it. Payments
//! are all-or-nothing against the assessed amount and exactly-once per
//! loan: the check and the `Unpaid → Paid` flip happen under the loan's
//! entry lock, so a racing second payment observes `Paid` and is
//! rejected with `NothingDue`.

use crate::error::PaymentError;
use crate::loan::LoanBook;
use crate::types::{FineStatus, Payment, PaymentMethod};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Payment store and reconciler
#[derive(Debug, Default)]
pub struct PaymentReconciler {
    payments: DashMap<Uuid, Payment>,
}

impl PaymentReconciler {
    /// Create empty reconciler
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a payment against the fine on a loan
    ///
    /// `NothingDue` unless the loan has an unpaid fine; `AmountMismatch`
    /// unless `amount` equals the assessed fine exactly. On success the
    /// Payment record is created and the loan's fine flips to Paid in
    /// the same critical section.
    pub fn pay(
        &self,
        loans: &LoanBook,
        loan_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError> {
        let mut loan = loans
            .loan_mut(loan_id)
            .ok_or(PaymentError::NotFound(loan_id))?;

        if loan.fine_status != FineStatus::Unpaid {
            return Err(PaymentError::NothingDue(loan_id));
        }

        // Unpaid implies an assessed amount; guarded by the state machine
        let expected = loan.fine_amount.unwrap_or(Decimal::ZERO);
        if amount != expected {
            return Err(PaymentError::AmountMismatch {
                loan_id,
                expected,
                got: amount,
            });
        }

        let payment = Payment {
            id: Uuid::now_v7(),
            loan_id,
            amount,
            paid_at: now,
            method,
        };
        loan.fine_status = FineStatus::Paid;
        self.payments.insert(payment.id, payment.clone());

        tracing::debug!(
            payment = %payment.id,
            loan = %loan_id,
            amount = %amount,
            method = %method,
            "fine paid"
        );
        Ok(payment)
    }

    /// Get a payment by id
    pub fn get(&self, payment_id: Uuid) -> Option<Payment> {
        self.payments.get(&payment_id).map(|p| p.clone())
    }

    /// All payments, ordered by payment time
    pub fn list(&self) -> Vec<Payment> {
        let mut payments: Vec<Payment> =
            self.payments.iter().map(|p| p.clone()).collect();
        payments.sort_by_key(|p| p.paid_at);
        payments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StockLedger;
    use crate::member::{Member, MemberRole, MemberStatus};
    use crate::types::{BranchId, MemberId, TitleId};
    use chrono::{Duration, TimeZone};

    fn fined_loan() -> (LoanBook, Uuid, Decimal, DateTime<Utc>) {
        let book = LoanBook::new();
        let stock = StockLedger::new();
        let title = TitleId::new("BK001");
        let branch = BranchId::new("CB01");
        stock.restock(&title, &branch, 1).unwrap();

        let member = Member {
            id: MemberId::new("M001"),
            email: "m001@example.com".to_string(),
            name: "M001".to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            branch_id: None,
        };

        let t0 = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap();
        let loan = book
            .open(&member, &title, &branch, &stock, 14, 3, t0)
            .unwrap();
        let returned = t0 + Duration::days(19); // 5 days late at 2000/day
        book.close(loan.id, &stock, Decimal::from(2000), returned)
            .unwrap();

        (book, loan.id, Decimal::from(10000), returned)
    }

    #[test]
    fn test_exact_payment_clears_fine() {
        let (book, loan_id, fine, now) = fined_loan();
        let reconciler = PaymentReconciler::new();

        let payment = reconciler
            .pay(&book, loan_id, fine, PaymentMethod::Cash, now)
            .unwrap();
        assert_eq!(payment.amount, fine);
        assert_eq!(payment.loan_id, loan_id);
        assert_eq!(book.get(loan_id).unwrap().fine_status, FineStatus::Paid);
        assert_eq!(reconciler.get(payment.id).unwrap().id, payment.id);
    }

    #[test]
    fn test_wrong_amount_rejected_and_fine_stays_unpaid() {
        let (book, loan_id, fine, now) = fined_loan();
        let reconciler = PaymentReconciler::new();

        let err = reconciler
            .pay(
                &book,
                loan_id,
                fine - Decimal::from(1000),
                PaymentMethod::Cash,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, PaymentError::AmountMismatch { .. }));
        assert_eq!(book.get(loan_id).unwrap().fine_status, FineStatus::Unpaid);
        assert!(reconciler.list().is_empty());
    }

    #[test]
    fn test_second_payment_is_nothing_due() {
        let (book, loan_id, fine, now) = fined_loan();
        let reconciler = PaymentReconciler::new();

        reconciler
            .pay(&book, loan_id, fine, PaymentMethod::BankTransfer, now)
            .unwrap();
        let err = reconciler
            .pay(&book, loan_id, fine, PaymentMethod::BankTransfer, now)
            .unwrap_err();
        assert!(matches!(err, PaymentError::NothingDue(_)));
        // Exactly one Payment exists
        assert_eq!(reconciler.list().len(), 1);
    }

    #[test]
    fn test_pay_without_fine_is_nothing_due() {
        let book = LoanBook::new();
        let stock = StockLedger::new();
        let title = TitleId::new("BK001");
        let branch = BranchId::new("CB01");
        stock.restock(&title, &branch, 1).unwrap();

        let member = Member {
            id: MemberId::new("M001"),
            email: "m001@example.com".to_string(),
            name: "M001".to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            branch_id: None,
        };
        let t0 = Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap();
        let loan = book
            .open(&member, &title, &branch, &stock, 14, 3, t0)
            .unwrap();
        book.close(loan.id, &stock, Decimal::from(2000), t0).unwrap();

        let reconciler = PaymentReconciler::new();
        let err = reconciler
            .pay(&book, loan.id, Decimal::ZERO, PaymentMethod::Cash, t0)
            .unwrap_err();
        assert!(matches!(err, PaymentError::NothingDue(_)));
    }

    #[test]
    fn test_pay_unknown_loan() {
        let book = LoanBook::new();
        let reconciler = PaymentReconciler::new();
        let err = reconciler
            .pay(
                &book,
                Uuid::now_v7(),
                Decimal::from(2000),
                PaymentMethod::Cash,
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
    }
}
