//! Periodic overdue sweep
//!
//! Reporting only: classifies still-open loans past due, updates the
//! overdue gauge, and logs a summary for operators. Fine correctness
//! never depends on this having run — "overdue" is computed at query
//! time and fines are assessed at return time.

use crate::loan::LoanFilter;
use crate::service::LibraryService;
use crate::types::LoanDisplayStatus;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Summary of one sweep pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Open loans past due
    pub overdue_loans: usize,

    /// Sum of running fine estimates on those loans
    pub estimated_fines: Decimal,
}

/// Run one sweep pass
pub fn run_once(service: &LibraryService) -> SweepReport {
    let overdue = service.list_loans(&LoanFilter {
        status: Some(LoanDisplayStatus::Overdue),
        ..Default::default()
    });

    let estimated_fines: Decimal = overdue.iter().map(|v| v.fine_due).sum();
    let report = SweepReport {
        overdue_loans: overdue.len(),
        estimated_fines,
    };

    service.metrics().overdue_loans.set(report.overdue_loans as i64);
    info!(
        overdue = report.overdue_loans,
        estimated_fines = %report.estimated_fines,
        "overdue sweep complete"
    );
    report
}

/// Spawn the background sweep task on the configured interval
///
/// Returns the task handle so the host process can abort it on
/// shutdown.
pub fn spawn_overdue_sweep(service: Arc<LibraryService>) -> tokio::task::JoinHandle<()> {
    let period = Duration::from_secs(service.config().sweep.interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_once(&service);
        }
    })
}
