use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use cl_types::market::Symbol;

/// Option type — call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Call => write!(f, "Call"),
            OptionKind::Put => write!(f, "Put"),
        }
    }
}

/// A single options contract as delivered by an upstream chain source.
///
/// `implied_volatility` and `open_interest` come from untrusted feed data:
/// either may be absent, and the volatility may arrive as zero or negative.
/// The engine validates them per row; this type only carries them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying symbol.
    pub underlying: Symbol,
    /// Call or put.
    pub kind: OptionKind,
    /// Strike price.
    pub strike: Decimal,
    /// Expiration date.
    pub expiry: NaiveDate,
    /// Annualised implied volatility (e.g. 0.20 = 20 %), if quoted.
    pub implied_volatility: Option<f64>,
    /// Open interest, if quoted.
    pub open_interest: Option<u64>,
}

impl OptionContract {
    pub fn new(
        underlying: Symbol,
        kind: OptionKind,
        strike: Decimal,
        expiry: NaiveDate,
        implied_volatility: Option<f64>,
    ) -> Self {
        Self {
            underlying,
            kind,
            strike,
            expiry,
            implied_volatility,
            open_interest: None,
        }
    }

    pub fn with_open_interest(mut self, open_interest: u64) -> Self {
        self.open_interest = Some(open_interest);
        self
    }

    /// Years from `valuation` to expiry, counted in calendar days over 365.
    /// Signed: zero when expiring on `valuation`, negative when already expired.
    pub fn time_to_expiry_years(&self, valuation: NaiveDate) -> f64 {
        (self.expiry - valuation).num_days() as f64 / 365.0
    }

    /// True if the option has expired (or expires today) relative to `valuation`.
    pub fn is_expired(&self, valuation: NaiveDate) -> bool {
        self.expiry <= valuation
    }

    /// Intrinsic value given the current underlying price.
    pub fn intrinsic_value(&self, spot: Decimal) -> Decimal {
        let iv = match self.kind {
            OptionKind::Call => spot - self.strike,
            OptionKind::Put => self.strike - spot,
        };
        if iv > Decimal::ZERO {
            iv
        } else {
            Decimal::ZERO
        }
    }

    /// True when the option is in-the-money.
    pub fn is_itm(&self, spot: Decimal) -> bool {
        self.intrinsic_value(spot) > Decimal::ZERO
    }

    /// True when at-the-money (strike == spot, within tolerance).
    pub fn is_atm(&self, spot: f64, tolerance: Decimal) -> bool {
        let spot = Decimal::from_f64(spot).unwrap_or_default();
        (self.strike - spot).abs() <= tolerance
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.underlying.symbol,
            self.expiry.format("%Y-%m-%d"),
            self.strike,
            self.kind,
        )
    }
}
