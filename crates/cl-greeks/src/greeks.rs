use serde::{Deserialize, Serialize};

/// Option greeks computed from the pricing model.
///
/// Fields are either finite numbers or NaN. NaN marks "not computable for
/// this contract" (expired, zero/missing volatility, bad strike) and is
/// distinct from a legitimate zero; serde_json renders it as `null`, which
/// presentation layers should show as a blank cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Rate of change of option price w.r.t. underlying price.
    pub delta: f64,
    /// Rate of change of delta w.r.t. underlying price.
    pub gamma: f64,
    /// Rate of change of option price w.r.t. time (annualised).
    pub theta: f64,
    /// Rate of change of option price w.r.t. volatility (per 1.0 vol move).
    pub vega: f64,
    /// Rate of change of option price w.r.t. risk-free rate.
    pub rho: f64,
}

impl Greeks {
    /// The all-NaN sentinel row for contracts whose greeks are undefined.
    pub fn undefined() -> Self {
        Self {
            delta: f64::NAN,
            gamma: f64::NAN,
            theta: f64::NAN,
            vega: f64::NAN,
            rho: f64::NAN,
        }
    }

    /// True when every field is a finite number.
    pub fn is_defined(&self) -> bool {
        self.delta.is_finite()
            && self.gamma.is_finite()
            && self.theta.is_finite()
            && self.vega.is_finite()
            && self.rho.is_finite()
    }
}

/// Per-contract output of the greeks engine, in input-row order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GreeksResult {
    /// `(expiry - valuation_date).days / 365`. Zero or negative when expired.
    pub time_to_expiry_years: f64,
    pub greeks: Greeks,
}
