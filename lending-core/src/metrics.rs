//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `lending_loans_opened_total` - Loans opened
//! - `lending_loans_returned_total` - Loans returned
//! - `lending_fines_assessed_total` - Returns that incurred a fine
//! - `lending_fine_days_late` - Histogram of whole days late at return
//! - `lending_payments_recorded_total` - Fine payments recorded
//! - `lending_overdue_loans` - Overdue loans at the last sweep
//! - `lending_stock_inconsistencies_total` - Consistency errors detected

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Loans opened
    pub loans_opened: IntCounter,

    /// Loans returned
    pub loans_returned: IntCounter,

    /// Returns that incurred a fine
    pub fines_assessed: IntCounter,

    /// Days late at return
    pub fine_days_late: Histogram,

    /// Fine payments recorded
    pub payments_recorded: IntCounter,

    /// Overdue loans seen by the last sweep
    pub overdue_loans: IntGauge,

    /// Stock consistency errors detected
    pub stock_inconsistencies: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let loans_opened = IntCounter::with_opts(Opts::new(
            "lending_loans_opened_total",
            "Loans opened",
        ))?;
        registry.register(Box::new(loans_opened.clone()))?;

        let loans_returned = IntCounter::with_opts(Opts::new(
            "lending_loans_returned_total",
            "Loans returned",
        ))?;
        registry.register(Box::new(loans_returned.clone()))?;

        let fines_assessed = IntCounter::with_opts(Opts::new(
            "lending_fines_assessed_total",
            "Returns that incurred a fine",
        ))?;
        registry.register(Box::new(fines_assessed.clone()))?;

        let fine_days_late = Histogram::with_opts(
            HistogramOpts::new("lending_fine_days_late", "Whole days late at return")
                .buckets(vec![1.0, 2.0, 3.0, 5.0, 7.0, 14.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(fine_days_late.clone()))?;

        let payments_recorded = IntCounter::with_opts(Opts::new(
            "lending_payments_recorded_total",
            "Fine payments recorded",
        ))?;
        registry.register(Box::new(payments_recorded.clone()))?;

        let overdue_loans = IntGauge::with_opts(Opts::new(
            "lending_overdue_loans",
            "Overdue loans at the last sweep",
        ))?;
        registry.register(Box::new(overdue_loans.clone()))?;

        let stock_inconsistencies = IntCounter::with_opts(Opts::new(
            "lending_stock_inconsistencies_total",
            "Stock consistency errors detected",
        ))?;
        registry.register(Box::new(stock_inconsistencies.clone()))?;

        Ok(Self {
            loans_opened,
            loans_returned,
            fines_assessed,
            fine_days_late,
            payments_recorded,
            overdue_loans,
            stock_inconsistencies,
            registry,
        })
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
