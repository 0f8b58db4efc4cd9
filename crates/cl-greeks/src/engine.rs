//! Black-Scholes greeks over a chain of contracts.
//!
//! Call-side formulas applied uniformly to calls and puts, the convention of
//! the upstream analytics this engine reproduces. Degenerate rows (expired,
//! zero or missing volatility, non-positive strike) degrade to NaN sentinels
//! instead of failing the batch; only an unusable spot price aborts the call.

use rust_decimal::prelude::ToPrimitive;

use cl_types::{invalid_input, ClResult};

use crate::context::MarketContext;
use crate::contract::OptionContract;
use crate::greeks::{Greeks, GreeksResult};

// ---------- normal distribution helpers (no external dep) ----------

/// Standard normal cumulative distribution function (Abramowitz & Stegun 26.2.17).
fn norm_cdf(x: f64) -> f64 {
    if x >= 8.0 {
        return 1.0;
    }
    if x <= -8.0 {
        return 0.0;
    }

    let a1 = 0.254829592_f64;
    let a2 = -0.284496736_f64;
    let a3 = 1.421413741_f64;
    let a4 = -1.453152027_f64;
    let a5 = 1.061405429_f64;
    let p = 0.3275911_f64;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x_abs = x.abs();
    let t = 1.0 / (1.0 + p * x_abs);
    let y =
        1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x_abs * x_abs / 2.0).exp();

    0.5 * (1.0 + sign * y)
}

/// Standard normal probability density function.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

// ---------- Black-Scholes core ----------

/// Compute d1 and d2. d2 derives from d1.
fn d1_d2(s: f64, k: f64, r: f64, sigma: f64, t: f64) -> (f64, f64) {
    let d1 = ((s / k).ln() + (r + 0.5 * sigma * sigma) * t) / (sigma * t.sqrt());
    let d2 = d1 - sigma * t.sqrt();
    (d1, d2)
}

/// Output contract: finite or NaN, never ±∞.
fn finite_or_nan(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        f64::NAN
    }
}

fn undefined_row(t: f64) -> GreeksResult {
    GreeksResult {
        time_to_expiry_years: t,
        greeks: Greeks::undefined(),
    }
}

/// Greeks for a single contract against a shared market context.
fn compute_row(contract: &OptionContract, ctx: &MarketContext) -> GreeksResult {
    let t = contract.time_to_expiry_years(ctx.valuation_date);

    // Expired or expiring today: the log/sqrt terms are undefined.
    if t <= 0.0 {
        return undefined_row(t);
    }

    // Volatility from feed data: missing, zero, negative, or NaN all divide
    // the formulas into nonsense.
    let sigma = match contract.implied_volatility {
        Some(v) if v > 0.0 => v,
        _ => return undefined_row(t),
    };

    // A strike that is non-positive (or too large for f64) has no log-moneyness.
    let k = contract.strike.to_f64().unwrap_or(0.0);
    if k <= 0.0 {
        return undefined_row(t);
    }

    let s = ctx.spot_price;
    let r = ctx.risk_free_rate;

    let (d1, d2) = d1_d2(s, k, r, sigma, t);
    let sqrt_t = t.sqrt();
    let disc = (-r * t).exp();

    let delta = norm_cdf(d1);
    let gamma = norm_pdf(d1) / (s * sigma * sqrt_t);
    let theta = -(s * norm_pdf(d1) * sigma) / (2.0 * sqrt_t) - r * k * disc * norm_cdf(d2);
    let vega = s * norm_pdf(d1) * sqrt_t;
    let rho = k * t * disc * norm_cdf(d2);

    GreeksResult {
        time_to_expiry_years: t,
        greeks: Greeks {
            delta: finite_or_nan(delta),
            gamma: finite_or_nan(gamma),
            theta: finite_or_nan(theta),
            vega: finite_or_nan(vega),
            rho: finite_or_nan(rho),
        },
    }
}

/// Compute greeks for every contract in `contracts`.
///
/// Returns one result per input row, in input order; rows are independent, so
/// one malformed contract never affects its neighbours. The only whole-batch
/// failure is a non-positive (or non-finite) spot price, rejected up front
/// before any row is computed.
pub fn compute_greeks(
    contracts: &[OptionContract],
    ctx: &MarketContext,
) -> ClResult<Vec<GreeksResult>> {
    if !ctx.has_valid_spot() {
        return Err(invalid_input!(
            "spot price must be positive, got {}",
            ctx.spot_price
        ));
    }

    Ok(contracts.iter().map(|c| compute_row(c, ctx)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::OptionKind;
    use chrono::NaiveDate;
    use cl_types::market::Symbol;
    use cl_types::ClError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn valuation() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn one_year_out() -> NaiveDate {
        NaiveDate::from_ymd_opt(2027, 8, 6).unwrap()
    }

    fn contract(kind: OptionKind, strike: Decimal, iv: Option<f64>) -> OptionContract {
        OptionContract::new(Symbol::equity("RELIANCE"), kind, strike, one_year_out(), iv)
    }

    fn atm_context() -> MarketContext {
        MarketContext::new(100.0)
            .with_rate(0.01)
            .with_valuation_date(valuation())
    }

    #[test]
    fn test_known_value_atm_one_year() {
        // S = 100, K = 100, T = 1.0, sigma = 0.2, r = 0.01
        let c = contract(OptionKind::Call, dec!(100), Some(0.2));
        let results = compute_greeks(&[c], &atm_context()).unwrap();
        let row = &results[0];

        assert!((row.time_to_expiry_years - 1.0).abs() < 1e-9);

        // d1 = (0 + (0.01 + 0.02) * 1) / 0.2 = 0.15
        let g = &row.greeks;
        assert!((g.delta - 0.5596).abs() < 1e-2, "delta = {}", g.delta);
        // vega = 100 * pdf(0.15) * 1 = 39.448
        assert!((g.vega - 39.45).abs() < 1e-2, "vega = {}", g.vega);
        assert!(g.gamma > 0.0);
        assert!(g.theta < 0.0, "theta should be negative (time decay)");
        assert!(g.rho > 0.0);
        assert!(g.is_defined());
    }

    #[test]
    fn test_determinism_bitwise() {
        let batch = vec![
            contract(OptionKind::Call, dec!(90), Some(0.25)),
            contract(OptionKind::Put, dec!(110), Some(0.0)), // sentinel row
            contract(OptionKind::Call, dec!(100), None),     // sentinel row
        ];
        let ctx = atm_context();
        let a = compute_greeks(&batch, &ctx).unwrap();
        let b = compute_greeks(&batch, &ctx).unwrap();

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(
                x.time_to_expiry_years.to_bits(),
                y.time_to_expiry_years.to_bits()
            );
            assert_eq!(x.greeks.delta.to_bits(), y.greeks.delta.to_bits());
            assert_eq!(x.greeks.gamma.to_bits(), y.greeks.gamma.to_bits());
            assert_eq!(x.greeks.theta.to_bits(), y.greeks.theta.to_bits());
            assert_eq!(x.greeks.vega.to_bits(), y.greeks.vega.to_bits());
            assert_eq!(x.greeks.rho.to_bits(), y.greeks.rho.to_bits());
        }
    }

    #[test]
    fn test_empty_input() {
        let results = compute_greeks(&[], &atm_context()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_row_count_and_order() {
        let strikes = [dec!(80), dec!(90), dec!(100), dec!(110), dec!(120)];
        let batch: Vec<_> = strikes
            .iter()
            .map(|k| contract(OptionKind::Call, *k, Some(0.2)))
            .collect();
        let results = compute_greeks(&batch, &atm_context()).unwrap();

        assert_eq!(results.len(), batch.len());
        // Lower strike => deeper ITM => larger call delta; order must track input.
        for i in 1..results.len() {
            assert!(results[i].greeks.delta < results[i - 1].greeks.delta);
        }
    }

    #[test]
    fn test_expired_contract_is_sentinel() {
        let mut c = contract(OptionKind::Call, dec!(100), Some(0.2));
        c.expiry = valuation(); // expiring today
        let results = compute_greeks(&[c], &atm_context()).unwrap();
        assert_eq!(results[0].time_to_expiry_years, 0.0);
        assert!(results[0].greeks.delta.is_nan());
        assert!(!results[0].greeks.is_defined());
    }

    #[test]
    fn test_zero_volatility_is_sentinel() {
        let c = contract(OptionKind::Call, dec!(100), Some(0.0));
        let results = compute_greeks(&[c], &atm_context()).unwrap();
        assert!(results[0].greeks.vega.is_nan());
    }

    #[test]
    fn test_missing_and_negative_volatility_are_sentinel() {
        let batch = vec![
            contract(OptionKind::Call, dec!(100), None),
            contract(OptionKind::Call, dec!(100), Some(-0.2)),
            contract(OptionKind::Call, dec!(100), Some(f64::NAN)),
        ];
        for row in compute_greeks(&batch, &atm_context()).unwrap() {
            assert!(!row.greeks.is_defined());
        }
    }

    #[test]
    fn test_non_positive_strike_is_sentinel() {
        let c = contract(OptionKind::Call, dec!(0), Some(0.2));
        let results = compute_greeks(&[c], &atm_context()).unwrap();
        assert!(results[0].greeks.gamma.is_nan());
    }

    #[test]
    fn test_invalid_spot_aborts_batch() {
        let batch = vec![contract(OptionKind::Call, dec!(100), Some(0.2))];
        for spot in [0.0, -100.0, f64::NAN] {
            let ctx = MarketContext::new(spot).with_valuation_date(valuation());
            let err = compute_greeks(&batch, &ctx).unwrap_err();
            assert!(matches!(err, ClError::InvalidInput(_)), "spot = {spot}");
        }
    }

    #[test]
    fn test_mixed_validity_batch() {
        let batch = vec![
            contract(OptionKind::Call, dec!(100), Some(0.2)),
            contract(OptionKind::Call, dec!(100), Some(0.0)),
        ];
        let results = compute_greeks(&batch, &atm_context()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].greeks.is_defined());
        assert!((results[0].greeks.delta - 0.5596).abs() < 1e-2);
        assert!(!results[1].greeks.is_defined());
    }

    #[test]
    fn test_delta_monotone_in_spot() {
        let c = contract(OptionKind::Call, dec!(100), Some(0.2));
        let mut last = f64::NEG_INFINITY;
        for spot in (40..=200).step_by(5) {
            let ctx = MarketContext::new(spot as f64)
                .with_rate(0.01)
                .with_valuation_date(valuation());
            let delta = compute_greeks(std::slice::from_ref(&c), &ctx).unwrap()[0]
                .greeks
                .delta;
            assert!(delta >= last, "delta fell from {last} to {delta} at spot {spot}");
            last = delta;
        }
    }

    #[test]
    fn test_put_uses_call_convention() {
        // The engine applies one sign convention to both sides; a put at the
        // same strike/vol must come out identical to the call.
        let call = contract(OptionKind::Call, dec!(105), Some(0.3));
        let put = contract(OptionKind::Put, dec!(105), Some(0.3));
        let results = compute_greeks(&[call, put], &atm_context()).unwrap();
        assert_eq!(results[0].greeks, results[1].greeks);
        assert!(results[0].greeks.delta > 0.0);
    }

    #[test]
    fn test_extreme_volatility_folds_to_nan_not_infinity() {
        let c = contract(OptionKind::Call, dec!(100), Some(1e300));
        let results = compute_greeks(&[c], &atm_context()).unwrap();
        let g = results[0].greeks;
        for v in [g.delta, g.gamma, g.theta, g.vega, g.rho] {
            assert!(!v.is_infinite(), "greek leaked infinity: {v}");
        }
    }

    #[test]
    fn test_norm_cdf_boundaries() {
        assert!((norm_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!(norm_cdf(8.0) == 1.0);
        assert!(norm_cdf(-8.0) == 0.0);
    }
}
