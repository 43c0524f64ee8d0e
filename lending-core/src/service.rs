//! Library service façade
//!
//! Composes the stock ledger, loan state machine, fine calculator, and
//! payment reconciler into the three externally visible operations
//! (`borrow`, `return_loan`, `pay_fine`), plus the read-only query
//! surface consumed by reporting and the dashboard, plus catalog and
//! stock administration.
//!
//! Each operation is a single conceptual transaction. One audit event
//! is emitted per success; the sink is fire-and-forget and can never
//! fail the operation. Consistency errors detected mid-operation are
//! counted and logged, and the operation still completes with the
//! safest available action.

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::catalog::{Catalog, StockLedger};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{Error, LoanError, Result};
use crate::fine;
use crate::loan::{LoanBook, LoanFilter};
use crate::member::MemberDirectory;
use crate::metrics::Metrics;
use crate::payment::PaymentReconciler;
use crate::types::{
    BranchId, FineStatus, Loan, LoanDisplayStatus, LoanStatus, MemberId, Payment, PaymentMethod,
    StockKey, StockRecord, Title, TitleId, TitleUpdate,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Input for cataloguing a new title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTitle {
    /// Catalog id assigned by the library
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
    /// Category
    pub category: String,
    /// Optional description
    pub description: Option<String>,
}

/// Result of a successful return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnReceipt {
    /// The closed loan
    pub loan: Loan,

    /// Fine assessed at return (zero when on time)
    pub fine_amount: Decimal,
}

/// One loan as presented to the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanView {
    /// The loan record
    pub loan: Loan,

    /// Query-time classification (Active / Overdue / Returned)
    pub display_status: LoanDisplayStatus,

    /// Amount currently owed: the assessed unpaid fine for closed
    /// loans, or a running estimate for still-open overdue loans
    pub fine_due: Decimal,
}

/// Aggregate counts for the dashboard landing page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Catalogued titles
    pub titles: usize,

    /// Currently-active loans
    pub active_loans: usize,

    /// Active loans past due
    pub overdue_loans: usize,

    /// Sum of assessed, unpaid fines
    pub unpaid_fines_total: Decimal,
}

/// Library service façade
pub struct LibraryService {
    catalog: Catalog,
    stock: StockLedger,
    loans: LoanBook,
    payments: PaymentReconciler,
    members: Arc<dyn MemberDirectory>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    metrics: Metrics,
    config: Config,
}

impl LibraryService {
    /// Create a service with the given policy and collaborators
    pub fn new(
        config: Config,
        members: Arc<dyn MemberDirectory>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self> {
        config.validate()?;
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("failed to register metrics: {}", e)))?;

        Ok(Self {
            catalog: Catalog::new(),
            stock: StockLedger::new(),
            loans: LoanBook::new(),
            payments: PaymentReconciler::new(),
            members,
            clock,
            audit,
            metrics,
            config,
        })
    }

    // ------------------------------------------------------------------
    // The three externally invoked operations
    // ------------------------------------------------------------------

    /// Borrow one copy of a title at a branch
    pub fn borrow(
        &self,
        member_id: &MemberId,
        title_id: &TitleId,
        branch_id: &BranchId,
    ) -> Result<Loan> {
        // An unknown member is by definition not an ACTIVE member
        let member = self
            .members
            .get(member_id)
            .ok_or_else(|| LoanError::MemberIneligible(member_id.clone()))?;

        let now = self.clock.now();
        let loan = self.loans.open(
            &member,
            title_id,
            branch_id,
            &self.stock,
            self.config.loan_period_days,
            self.config.max_loans_per_member,
            now,
        )?;

        self.metrics.loans_opened.inc();
        self.audit.record(AuditEvent::new(
            AuditAction::LoanOpened,
            Some(member_id.clone()),
            Some(loan.id),
            format!("borrowed {} at {}", title_id, branch_id),
            now,
        ));
        Ok(loan)
    }

    /// Return a borrowed copy and assess any fine
    pub fn return_loan(&self, loan_id: Uuid) -> Result<ReturnReceipt> {
        let now = self.clock.now();
        let outcome = self
            .loans
            .close(loan_id, &self.stock, self.config.fine_per_day, now)?;

        self.metrics.loans_returned.inc();
        let fine_amount = outcome.loan.fine_amount.unwrap_or(Decimal::ZERO);
        if fine_amount > Decimal::ZERO {
            self.metrics.fines_assessed.inc();
            let days_late = (now - outcome.loan.due_at).num_days();
            self.metrics.fine_days_late.observe(days_late as f64);
        }
        if outcome.stock_error.is_some() {
            self.metrics.stock_inconsistencies.inc();
        }

        self.audit.record(AuditEvent::new(
            AuditAction::LoanReturned,
            Some(outcome.loan.member_id.clone()),
            Some(loan_id),
            format!(
                "returned {} at {} (fine {})",
                outcome.loan.title_id, outcome.loan.branch_id, fine_amount
            ),
            now,
        ));
        Ok(ReturnReceipt {
            loan: outcome.loan,
            fine_amount,
        })
    }

    /// Pay the outstanding fine on a loan, exact amount only
    pub fn pay_fine(
        &self,
        loan_id: Uuid,
        amount: Decimal,
        method: PaymentMethod,
    ) -> Result<Payment> {
        let now = self.clock.now();
        let payment = self
            .payments
            .pay(&self.loans, loan_id, amount, method, now)?;

        self.metrics.payments_recorded.inc();
        let member_id = self.loans.get(loan_id).map(|l| l.member_id);
        self.audit.record(AuditEvent::new(
            AuditAction::FinePaid,
            member_id,
            Some(loan_id),
            format!("paid fine of {} via {}", amount, method),
            now,
        ));
        Ok(payment)
    }

    // ------------------------------------------------------------------
    // Read-only query surface (reporting / dashboard)
    // ------------------------------------------------------------------

    /// Loans matching a filter, with classification and amounts owed
    pub fn list_loans(&self, filter: &LoanFilter) -> Vec<LoanView> {
        let now = self.clock.now();
        self.loans
            .list(filter, now)
            .into_iter()
            .map(|loan| self.view_of(loan, now))
            .collect()
    }

    /// One loan by id
    pub fn get_loan(&self, loan_id: Uuid) -> Option<LoanView> {
        let now = self.clock.now();
        self.loans.get(loan_id).map(|loan| self.view_of(loan, now))
    }

    /// Current counts for a (title, branch) pair
    pub fn get_stock(&self, title_id: &TitleId, branch_id: &BranchId) -> Option<StockRecord> {
        self.stock.get(title_id, branch_id)
    }

    /// All stock records
    pub fn list_stock(&self) -> Vec<(StockKey, StockRecord)> {
        self.stock.list()
    }

    /// Closed loans with an assessed, still-unpaid fine
    pub fn outstanding_fines(&self) -> Vec<LoanView> {
        let now = self.clock.now();
        self.loans
            .list(&LoanFilter::default(), now)
            .into_iter()
            .filter(|l| l.fine_status == FineStatus::Unpaid)
            .map(|loan| self.view_of(loan, now))
            .collect()
    }

    /// Payments recorded so far
    pub fn list_payments(&self) -> Vec<Payment> {
        self.payments.list()
    }

    /// All catalogued titles
    pub fn list_titles(&self) -> Vec<Title> {
        self.catalog.list_titles()
    }

    /// Aggregate counts for the dashboard landing page
    pub fn dashboard_stats(&self) -> DashboardStats {
        let now = self.clock.now();
        let loans = self.loans.list(&LoanFilter::default(), now);

        let mut active = 0usize;
        let mut overdue = 0usize;
        let mut unpaid = Decimal::ZERO;
        for loan in &loans {
            match loan.display_status(now) {
                LoanDisplayStatus::Active => active += 1,
                LoanDisplayStatus::Overdue => {
                    active += 1;
                    overdue += 1;
                }
                LoanDisplayStatus::Returned => {}
            }
            if loan.fine_status == FineStatus::Unpaid {
                unpaid += loan.fine_amount.unwrap_or(Decimal::ZERO);
            }
        }

        DashboardStats {
            titles: self.catalog.len(),
            active_loans: active,
            overdue_loans: overdue,
            unpaid_fines_total: unpaid,
        }
    }

    // ------------------------------------------------------------------
    // Catalog & stock administration (not in the hot path)
    // ------------------------------------------------------------------

    /// Add a title to the catalog
    pub fn add_title(&self, new: NewTitle) -> Title {
        let now = self.clock.now();
        let title = Title {
            id: new.id,
            isbn: new.isbn,
            name: new.name,
            author: new.author,
            publisher: new.publisher,
            year: new.year,
            category: new.category,
            description: new.description,
            created_at: now,
        };
        self.catalog.add_title(title.clone());
        self.audit.record(AuditEvent::new(
            AuditAction::TitleAdded,
            None,
            None,
            format!("added title {} ({})", title.id, title.name),
            now,
        ));
        title
    }

    /// Edit a catalogued title
    pub fn edit_title(&self, id: &TitleId, update: TitleUpdate) -> Option<Title> {
        self.catalog.edit_title(id, update)
    }

    /// Adjust stock at a branch
    pub fn restock(
        &self,
        title_id: &TitleId,
        branch_id: &BranchId,
        delta: i64,
    ) -> Result<StockRecord> {
        let record = self.stock.restock(title_id, branch_id, delta)?;
        self.audit.record(AuditEvent::new(
            AuditAction::Restocked,
            None,
            None,
            format!(
                "restocked {} at {} by {} (now {}/{})",
                title_id, branch_id, delta, record.available_copies, record.total_copies
            ),
            self.clock.now(),
        ));
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Metrics collector (for scraping/export by the host process)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Active policy configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn view_of(&self, loan: Loan, now: chrono::DateTime<chrono::Utc>) -> LoanView {
        let display_status = loan.display_status(now);
        let fine_due = match loan.status {
            LoanStatus::Returned => match loan.fine_status {
                FineStatus::Unpaid => loan.fine_amount.unwrap_or(Decimal::ZERO),
                _ => Decimal::ZERO,
            },
            // Running estimate for still-open loans
            LoanStatus::Active => fine::fine_for(loan.due_at, now, self.config.fine_per_day),
        };
        LoanView {
            loan,
            display_status,
            fine_due,
        }
    }
}

impl std::fmt::Debug for LibraryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemoryAuditSink;
    use crate::clock::ManualClock;
    use crate::member::{InMemoryMemberDirectory, Member, MemberRole, MemberStatus};
    use chrono::{TimeZone, Utc};

    struct Fixture {
        service: LibraryService,
        clock: Arc<ManualClock>,
        audit: Arc<MemoryAuditSink>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 9, 0, 0).unwrap(),
        ));
        let audit = Arc::new(MemoryAuditSink::new());
        let members = Arc::new(InMemoryMemberDirectory::new());

        members.upsert(Member {
            id: MemberId::new("M001"),
            email: "budi@example.com".to_string(),
            name: "Budi Santoso".to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Active,
            branch_id: Some(BranchId::new("CB01")),
        });
        members.upsert(Member {
            id: MemberId::new("M002"),
            email: "siti@example.com".to_string(),
            name: "Siti Nurhaliza".to_string(),
            role: MemberRole::Member,
            status: MemberStatus::Inactive,
            branch_id: None,
        });

        let service = LibraryService::new(
            Config::default(),
            members,
            clock.clone(),
            audit.clone(),
        )
        .unwrap();

        service.add_title(NewTitle {
            id: TitleId::new("BK001"),
            isbn: "978-602-03-1234-5".to_string(),
            name: "Laskar Pelangi".to_string(),
            author: "Andrea Hirata".to_string(),
            publisher: "Bentang Pustaka".to_string(),
            year: 2005,
            category: "Fiksi".to_string(),
            description: None,
        });
        service
            .restock(&TitleId::new("BK001"), &BranchId::new("CB01"), 2)
            .unwrap();

        Fixture {
            service,
            clock,
            audit,
        }
    }

    #[test]
    fn test_borrow_unknown_member_is_ineligible() {
        let fx = fixture();
        let err = fx
            .service
            .borrow(
                &MemberId::new("M999"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Loan(LoanError::MemberIneligible(_))));
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_borrow_inactive_member_is_ineligible() {
        let fx = fixture();
        let err = fx
            .service
            .borrow(
                &MemberId::new("M002"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Loan(LoanError::MemberIneligible(_))));
    }

    #[test]
    fn test_borrow_emits_audit_and_metrics() {
        let fx = fixture();
        let loan = fx
            .service
            .borrow(
                &MemberId::new("M001"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap();

        assert_eq!(fx.service.metrics().loans_opened.get(), 1);
        let events = fx.audit.events();
        let open_events: Vec<_> = events
            .iter()
            .filter(|e| e.action == AuditAction::LoanOpened)
            .collect();
        assert_eq!(open_events.len(), 1);
        assert_eq!(open_events[0].loan_id, Some(loan.id));
    }

    #[test]
    fn test_late_return_then_exact_payment() {
        let fx = fixture();
        let loan = fx
            .service
            .borrow(
                &MemberId::new("M001"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap();

        fx.clock.advance_days(19); // due at 14, so 5 days late
        let receipt = fx.service.return_loan(loan.id).unwrap();
        assert_eq!(receipt.fine_amount, Decimal::from(10000));

        let outstanding = fx.service.outstanding_fines();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].fine_due, Decimal::from(10000));

        let payment = fx
            .service
            .pay_fine(loan.id, Decimal::from(10000), PaymentMethod::EWallet)
            .unwrap();
        assert_eq!(payment.amount, Decimal::from(10000));
        assert!(fx.service.outstanding_fines().is_empty());
        assert_eq!(fx.service.metrics().payments_recorded.get(), 1);
    }

    #[test]
    fn test_overdue_loan_shows_running_estimate() {
        let fx = fixture();
        let loan = fx
            .service
            .borrow(
                &MemberId::new("M001"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap();

        fx.clock.advance_days(17); // 3 days past due, still open
        let view = fx.service.get_loan(loan.id).unwrap();
        assert_eq!(view.display_status, LoanDisplayStatus::Overdue);
        assert_eq!(view.fine_due, Decimal::from(6000));
        // Nothing assessed yet: the estimate is display-only
        assert!(view.loan.fine_amount.is_none());
    }

    #[test]
    fn test_dashboard_stats() {
        let fx = fixture();
        let m = MemberId::new("M001");
        let t = TitleId::new("BK001");
        let b = BranchId::new("CB01");

        let a = fx.service.borrow(&m, &t, &b).unwrap();
        let _b2 = fx.service.borrow(&m, &t, &b).unwrap();

        fx.clock.advance_days(19);
        fx.service.return_loan(a.id).unwrap(); // assesses 10000

        let stats = fx.service.dashboard_stats();
        assert_eq!(stats.titles, 1);
        assert_eq!(stats.active_loans, 1);
        assert_eq!(stats.overdue_loans, 1);
        assert_eq!(stats.unpaid_fines_total, Decimal::from(10000));
    }

    #[test]
    fn test_views_serialize_for_the_dashboard() {
        let fx = fixture();
        let loan = fx
            .service
            .borrow(
                &MemberId::new("M001"),
                &TitleId::new("BK001"),
                &BranchId::new("CB01"),
            )
            .unwrap();
        fx.clock.advance_days(17);

        let view = fx.service.get_loan(loan.id).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["display_status"], "Overdue");
        assert_eq!(json["loan"]["member_id"], "M001");

        let stats = serde_json::to_value(fx.service.dashboard_stats()).unwrap();
        assert_eq!(stats["active_loans"], 1);
        assert_eq!(stats["overdue_loans"], 1);
    }

    #[test]
    fn test_return_unknown_loan_maps_to_404() {
        let fx = fixture();
        let err = fx.service.return_loan(Uuid::now_v7()).unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
