//! Delimited-text export of an analyzed chain.

use std::io::Write;

use cl_greeks::AnalyzedChain;
use cl_types::{ClError, ClResult};

const HEADER: [&str; 14] = [
    "underlying",
    "kind",
    "strike",
    "expiry",
    "implied_volatility",
    "open_interest",
    "time_to_expiry_years",
    "delta",
    "gamma",
    "theta",
    "vega",
    "rho",
    "roi",
    "breakeven",
];

/// Sentinel greeks export as empty cells; "not computable" is not zero.
fn cell(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        String::new()
    }
}

fn opt_cell(v: Option<f64>) -> String {
    v.map(cell).unwrap_or_default()
}

/// Write `chain` as CSV: one header row, one record per chain row, input order.
pub fn write_csv<W: Write>(chain: &AnalyzedChain, writer: W) -> ClResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(HEADER)
        .map_err(|e| ClError::Export(e.to_string()))?;

    for row in &chain.rows {
        let c = &row.contract;
        let g = &row.result.greeks;
        wtr.write_record([
            c.underlying.symbol.clone(),
            c.kind.to_string(),
            c.strike.to_string(),
            c.expiry.format("%Y-%m-%d").to_string(),
            opt_cell(c.implied_volatility),
            c.open_interest.map(|oi| oi.to_string()).unwrap_or_default(),
            cell(row.result.time_to_expiry_years),
            cell(g.delta),
            cell(g.gamma),
            cell(g.theta),
            cell(g.vega),
            cell(g.rho),
            cell(row.roi),
            cell(row.breakeven),
        ])
        .map_err(|e| ClError::Export(e.to_string()))?;
    }

    wtr.flush()?;
    Ok(())
}

/// CSV as an in-memory string, for download-style consumers.
pub fn to_csv_string(chain: &AnalyzedChain) -> ClResult<String> {
    let mut buf = Vec::new();
    write_csv(chain, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ClError::Export(e.to_string()))
}
