use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Annualised risk-free rate assumed when the caller does not supply one.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.01;

/// Inputs shared by every row of a single greeks computation.
///
/// Replaces module-level defaults with explicit per-call fields: the caller
/// constructs one of these for each invocation, so there is no process-wide
/// mutable configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Current underlying spot price. Must be positive.
    pub spot_price: f64,
    /// Annualised risk-free rate (e.g. 0.05 = 5 %).
    pub risk_free_rate: f64,
    /// The "today" used for time-to-expiry.
    pub valuation_date: NaiveDate,
}

impl MarketContext {
    /// Context with the default risk-free rate, valued as of the current UTC date.
    pub fn new(spot_price: f64) -> Self {
        Self {
            spot_price,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            valuation_date: Utc::now().date_naive(),
        }
    }

    pub fn with_rate(mut self, risk_free_rate: f64) -> Self {
        self.risk_free_rate = risk_free_rate;
        self
    }

    pub fn with_valuation_date(mut self, valuation_date: NaiveDate) -> Self {
        self.valuation_date = valuation_date;
        self
    }

    /// True when the spot price is usable by the pricing formulas.
    pub fn has_valid_spot(&self) -> bool {
        self.spot_price.is_finite() && self.spot_price > 0.0
    }
}
