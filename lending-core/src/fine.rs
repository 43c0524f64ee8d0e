//! Fine computation
//!
//! Pure and deterministic: callable at return time with the actual
//! return date, and at query time with the current date to show a
//! running estimate for still-open overdue loans.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Fine owed for a loan due at `due_at`, as of `as_of`
///
/// `max(0, whole_days_late) * rate_per_day`; partial days never round
/// up.
pub fn fine_for(due_at: DateTime<Utc>, as_of: DateTime<Utc>, rate_per_day: Decimal) -> Decimal {
    let days_late = (as_of - due_at).num_days();
    if days_late <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(days_late) * rate_per_day
}
