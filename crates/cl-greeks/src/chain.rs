//! The analyzed chain: input rows augmented with greeks and chain metrics.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cl_types::market::Symbol;
use cl_types::ClResult;

use crate::context::MarketContext;
use crate::contract::OptionContract;
use crate::engine::compute_greeks;
use crate::greeks::GreeksResult;

/// One input contract together with everything computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedRow {
    pub contract: OptionContract,
    pub result: GreeksResult,
    /// Moneyness ratio `(strike - spot) / strike`.
    pub roi: f64,
    /// `strike + strike * roi`.
    pub breakeven: f64,
}

/// An option chain augmented with per-row analytics.
///
/// Same rows, same order as the input chain. A row whose greeks could not be
/// computed carries NaN sentinels, it is never dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedChain {
    pub underlying: Symbol,
    pub spot: f64,
    pub valuation_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<AnalyzedRow>,
}

/// Run the greeks engine over `contracts` and pair each row with its metrics.
pub fn analyze_chain(
    underlying: Symbol,
    contracts: Vec<OptionContract>,
    ctx: &MarketContext,
) -> ClResult<AnalyzedChain> {
    let results = compute_greeks(&contracts, ctx)?;

    let rows = contracts
        .into_iter()
        .zip(results)
        .map(|(contract, result)| {
            let (roi, breakeven) = chain_metrics(&contract, ctx.spot_price);
            AnalyzedRow {
                contract,
                result,
                roi,
                breakeven,
            }
        })
        .collect();

    Ok(AnalyzedChain {
        underlying,
        spot: ctx.spot_price,
        valuation_date: ctx.valuation_date,
        generated_at: Utc::now(),
        rows,
    })
}

fn chain_metrics(contract: &OptionContract, spot: f64) -> (f64, f64) {
    let k = contract.strike.to_f64().unwrap_or(0.0);
    if k <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let roi = (k - spot) / k;
    let breakeven = k + k * roi;
    (roi, breakeven)
}

impl AnalyzedChain {
    /// The strike closest to spot.
    pub fn atm_strike(&self) -> Option<Decimal> {
        let spot = Decimal::from_f64(self.spot)?;
        self.rows
            .iter()
            .min_by_key(|r| {
                let diff = (r.contract.strike - spot).abs();
                // Convert to a sortable integer (basis-point precision)
                (diff * Decimal::from(10000)).to_i64().unwrap_or(i64::MAX)
            })
            .map(|r| r.contract.strike)
    }

    /// First row at the given strike, if any.
    pub fn get_strike(&self, strike: Decimal) -> Option<&AnalyzedRow> {
        self.rows.iter().find(|r| r.contract.strike == strike)
    }

    /// Number of rows whose greeks came back as the NaN sentinel.
    pub fn undefined_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| !r.result.greeks.is_defined())
            .count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
