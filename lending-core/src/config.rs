//! Configuration for the lending engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lending policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Loan period in days (due date = borrow date + this)
    pub loan_period_days: i64,

    /// Fine accrued per whole day late
    pub fine_per_day: Decimal,

    /// Maximum concurrently-active loans per member
    pub max_loans_per_member: u32,

    /// Overdue sweep configuration
    pub sweep: SweepConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            fine_per_day: Decimal::from(2000),
            max_loans_per_member: 3,
            sweep: SweepConfig::default(),
        }
    }
}

/// Overdue sweep configuration
///
/// The sweep is reporting-only; fine correctness never depends on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Enable the background sweep task
    pub enabled: bool,

    /// Sweep interval (seconds)
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600, // hourly is plenty for dashboard counts
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, starting from defaults
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(days) = std::env::var("LENDING_LOAN_PERIOD_DAYS") {
            config.loan_period_days = days
                .parse()
                .map_err(|_| crate::Error::Config(format!("bad loan period: {}", days)))?;
        }

        if let Ok(rate) = std::env::var("LENDING_FINE_PER_DAY") {
            config.fine_per_day = rate
                .parse()
                .map_err(|_| crate::Error::Config(format!("bad fine rate: {}", rate)))?;
        }

        if let Ok(limit) = std::env::var("LENDING_MAX_LOANS_PER_MEMBER") {
            config.max_loans_per_member = limit
                .parse()
                .map_err(|_| crate::Error::Config(format!("bad loan limit: {}", limit)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate invariants on the policy values
    pub fn validate(&self) -> crate::Result<()> {
        if self.loan_period_days <= 0 {
            return Err(crate::Error::Config(
                "loan_period_days must be positive".to_string(),
            ));
        }
        if self.fine_per_day < Decimal::ZERO {
            return Err(crate::Error::Config(
                "fine_per_day must not be negative".to_string(),
            ));
        }
        if self.max_loans_per_member == 0 {
            return Err(crate::Error::Config(
                "max_loans_per_member must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
