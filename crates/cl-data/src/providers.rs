use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use csv::ReaderBuilder;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

use cl_greeks::{OptionContract, OptionKind};
use cl_types::{AssetClass, ClResult, DataError, Symbol};

/// A normalized option chain as delivered by a provider: the typed boundary
/// between untrusted upstream data and the greeks engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSnapshot {
    pub underlying: Symbol,
    pub expiration: NaiveDate,
    /// Spot price of the underlying at retrieval time.
    pub spot_price: f64,
    pub contracts: Vec<OptionContract>,
    pub retrieved_at: DateTime<Utc>,
}

/// Trait for option-chain providers (CSV files, APIs, synthetic data).
#[async_trait]
pub trait ChainDataProvider: Send + Sync + std::fmt::Debug {
    /// Check if this provider supports the given symbol
    fn supports_symbol(&self, symbol: &Symbol) -> bool;

    /// Fetch the chain for one underlying/expiration pair
    async fn fetch_chain(
        &mut self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> ClResult<ChainSnapshot>;

    /// Get provider name
    fn name(&self) -> &str;

    /// Get provider configuration
    fn config(&self) -> serde_json::Value;
}

fn parse_kind(raw: &str) -> Result<OptionKind, DataError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "call" | "ce" | "c" => Ok(OptionKind::Call),
        "put" | "pe" | "p" => Ok(OptionKind::Put),
        other => Err(DataError::ParseError {
            message: format!("unknown option kind '{other}'"),
        }),
    }
}

fn parse_expiry(raw: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d-%b-%Y"))
        .map_err(|e| DataError::ParseError {
            message: format!("date parsing error for '{raw}': {e}"),
        })
}

/// CSV chain provider for loading local option-chain dumps
#[derive(Debug)]
pub struct CsvChainProvider {
    pub name: String,
    pub data_directory: std::path::PathBuf,
    pub file_pattern: String,
}

#[derive(Debug, Deserialize)]
struct CsvChainRecord {
    #[serde(alias = "Strike", alias = "strikePrice")]
    strike: f64,
    #[serde(alias = "Expiry", alias = "lastTradeDate")]
    expiry: String,
    #[serde(alias = "Type", alias = "optionType")]
    kind: String,
    #[serde(alias = "impliedVolatility", alias = "iv")]
    implied_volatility: Option<f64>,
    #[serde(default, alias = "openInterest")]
    open_interest: Option<u64>,
    #[serde(default, alias = "underlyingValue", alias = "underlyingPrice")]
    underlying_price: Option<f64>,
}

impl CsvChainProvider {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            name: "CSV Chain Provider".to_string(),
            data_directory: data_directory.as_ref().to_path_buf(),
            file_pattern: "{symbol}_{expiration}.csv".to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.file_pattern = pattern.to_string();
        self
    }

    fn get_file_path(&self, symbol: &Symbol, expiration: NaiveDate) -> std::path::PathBuf {
        let filename = self
            .file_pattern
            .replace("{symbol}", &symbol.symbol)
            .replace("{expiration}", &expiration.format("%Y-%m-%d").to_string())
            .replace("{exchange}", &symbol.exchange);

        self.data_directory.join(filename)
    }
}

#[async_trait]
impl ChainDataProvider for CsvChainProvider {
    fn supports_symbol(&self, _symbol: &Symbol) -> bool {
        self.data_directory.exists()
    }

    async fn fetch_chain(
        &mut self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> ClResult<ChainSnapshot> {
        let file_path = self.get_file_path(symbol, expiration);

        if !file_path.exists() {
            return Err(DataError::SourceNotFound(
                file_path.to_string_lossy().to_string(),
            )
            .into());
        }

        let file = std::fs::File::open(&file_path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let mut contracts = Vec::new();
        let mut spot_price: Option<f64> = None;

        for result in reader.deserialize() {
            let record: CsvChainRecord = result.map_err(|e| DataError::ParseError {
                message: format!("CSV parsing error: {e}"),
            })?;

            let kind = parse_kind(&record.kind)?;
            let expiry = parse_expiry(&record.expiry)?;

            if spot_price.is_none() {
                spot_price = record.underlying_price;
            }

            let contract = OptionContract {
                underlying: symbol.clone(),
                kind,
                strike: Decimal::from_f64(record.strike).unwrap_or_default(),
                expiry,
                implied_volatility: record.implied_volatility,
                open_interest: record.open_interest,
            };
            contracts.push(contract);
        }

        let spot_price = spot_price.ok_or_else(|| DataError::InvalidFormat {
            message: format!(
                "no underlying price column in {}",
                file_path.to_string_lossy()
            ),
        })?;

        tracing::info!(
            "Loaded {} contracts for {} from {}",
            contracts.len(),
            symbol,
            file_path.to_string_lossy()
        );

        Ok(ChainSnapshot {
            underlying: symbol.clone(),
            expiration,
            spot_price,
            contracts,
            retrieved_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "csv",
            "directory": self.data_directory,
            "pattern": self.file_pattern
        })
    }
}

/// Sample chain provider for testing and demo purposes
#[derive(Debug)]
pub struct SampleChainProvider {
    pub name: String,
}

impl SampleChainProvider {
    pub fn new() -> Self {
        Self {
            name: "Sample Chain Provider".to_string(),
        }
    }

    fn spot_and_step(symbol: &str) -> Option<(f64, f64)> {
        match symbol {
            "NIFTY" => Some((24350.0, 100.0)),
            "BANKNIFTY" => Some((52100.0, 200.0)),
            "RELIANCE" => Some((2845.0, 20.0)),
            "TCS" => Some((4120.0, 50.0)),
            _ => None,
        }
    }
}

impl Default for SampleChainProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainDataProvider for SampleChainProvider {
    fn supports_symbol(&self, symbol: &Symbol) -> bool {
        Self::spot_and_step(&symbol.symbol).is_some()
    }

    async fn fetch_chain(
        &mut self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> ClResult<ChainSnapshot> {
        let (spot, step) = Self::spot_and_step(&symbol.symbol).ok_or(DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;

        let atm_strike = (spot / step).round() * step;
        let mut contracts = Vec::new();
        let mut rng_state = 12345u64; // Simple PRNG

        for i in -5i64..=5 {
            let strike_f = atm_strike + i as f64 * step;
            if strike_f <= 0.0 {
                continue;
            }
            let strike = Decimal::from_f64(strike_f).unwrap_or_default();

            // Deterministic wiggle around a smile-shaped base vol
            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            let random = (rng_state >> 16) as f64 / 65536.0 - 0.5; // -0.5 to 0.5
            let iv = 0.15 + 0.004 * i.unsigned_abs() as f64 + random * 0.01;

            rng_state = rng_state.wrapping_mul(1103515245).wrapping_add(12345);
            let open_interest = 50_000 + (rng_state >> 40);

            for kind in [OptionKind::Call, OptionKind::Put] {
                let contract = OptionContract {
                    underlying: symbol.clone(),
                    kind,
                    strike,
                    expiry: expiration,
                    implied_volatility: Some(iv),
                    open_interest: Some(open_interest),
                };
                contracts.push(contract);
            }
        }

        Ok(ChainSnapshot {
            underlying: symbol.clone(),
            expiration,
            spot_price: spot,
            contracts,
            retrieved_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "sample",
            "supported_symbols": ["NIFTY", "BANKNIFTY", "RELIANCE", "TCS"]
        })
    }
}

/// Alpha Vantage option-chain provider
#[derive(Debug)]
pub struct AlphaVantageChainProvider {
    pub name: String,
    pub api_key: String,
    pub client: reqwest::Client,
}

impl AlphaVantageChainProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            name: "Alpha Vantage".to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn check_api_errors(json: &serde_json::Value) -> Result<(), DataError> {
        if let Some(error) = json.get("Error Message") {
            return Err(DataError::LoadingFailed {
                message: format!("API error: {error}"),
            });
        }
        if let Some(note) = json.get("Note") {
            return Err(DataError::LoadingFailed {
                message: format!("API limit exceeded: {note}"),
            });
        }
        Ok(())
    }

    /// Parse the chain payload. Alpha Vantage delivers every numeric field as
    /// a string.
    fn parse_chain_response(
        &self,
        response: &serde_json::Value,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> ClResult<Vec<OptionContract>> {
        let rows = response
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| DataError::ParseError {
                message: "Missing 'data' array in response".to_string(),
            })?;

        let mut contracts = Vec::new();

        for row in rows {
            let obj = row.as_object().ok_or_else(|| DataError::ParseError {
                message: "Chain row is not an object".to_string(),
            })?;

            let kind = parse_kind(Self::str_field(obj, "type")?)?;
            let expiry = parse_expiry(Self::str_field(obj, "expiration")?)?;
            if expiry != expiration {
                continue;
            }

            let strike = Self::f64_field(obj, "strike")?;
            // Optional fields: absent or unparsable means "not quoted"
            let implied_volatility = Self::str_field(obj, "implied_volatility")
                .ok()
                .and_then(|s| s.parse::<f64>().ok());
            let open_interest = Self::str_field(obj, "open_interest")
                .ok()
                .and_then(|s| s.parse::<u64>().ok());

            contracts.push(OptionContract {
                underlying: symbol.clone(),
                kind,
                strike: Decimal::from_f64(strike).unwrap_or_default(),
                expiry,
                implied_volatility,
                open_interest,
            });
        }

        Ok(contracts)
    }

    /// Parse the spot price out of a GLOBAL_QUOTE payload.
    fn parse_global_quote(&self, response: &serde_json::Value) -> ClResult<f64> {
        let quote = response
            .get("Global Quote")
            .and_then(|q| q.as_object())
            .ok_or_else(|| DataError::ParseError {
                message: "Missing 'Global Quote' in response".to_string(),
            })?;

        Ok(Self::f64_field(quote, "05. price")?)
    }

    fn str_field<'a>(
        obj: &'a serde_json::Map<String, serde_json::Value>,
        field: &str,
    ) -> Result<&'a str, DataError> {
        obj.get(field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| DataError::ParseError {
                message: format!("Missing field '{field}'"),
            })
    }

    fn f64_field(
        obj: &serde_json::Map<String, serde_json::Value>,
        field: &str,
    ) -> Result<f64, DataError> {
        let raw = Self::str_field(obj, field)?;
        raw.parse::<f64>().map_err(|e| DataError::ParseError {
            message: format!("Failed to parse {field} value '{raw}': {e}"),
        })
    }

    async fn get_json(&self, url: &str) -> ClResult<serde_json::Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::LoadingFailed {
                message: format!("HTTP request failed: {e}"),
            })?;

        if !response.status().is_success() {
            return Err(DataError::LoadingFailed {
                message: format!("HTTP error: {}", response.status()),
            }
            .into());
        }

        let json: serde_json::Value =
            response.json().await.map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to parse JSON response: {e}"),
            })?;

        Self::check_api_errors(&json)?;
        Ok(json)
    }
}

#[async_trait]
impl ChainDataProvider for AlphaVantageChainProvider {
    fn supports_symbol(&self, symbol: &Symbol) -> bool {
        // Alpha Vantage covers listed equities, not index chains
        matches!(symbol.asset_class, AssetClass::Equity)
    }

    async fn fetch_chain(
        &mut self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> ClResult<ChainSnapshot> {
        tracing::info!("Fetching option chain from Alpha Vantage for {}", symbol);

        let chain_url = format!(
            "https://www.alphavantage.co/query?function=OPTION_CHAINS&symbol={}&expiration={}&apikey={}",
            symbol.symbol,
            expiration.format("%Y-%m-%d"),
            self.api_key
        );
        let chain_json = self.get_json(&chain_url).await?;
        let contracts = self.parse_chain_response(&chain_json, symbol, expiration)?;

        let quote_url = format!(
            "https://www.alphavantage.co/query?function=GLOBAL_QUOTE&symbol={}&apikey={}",
            symbol.symbol, self.api_key
        );
        let quote_json = self.get_json(&quote_url).await?;
        let spot_price = self.parse_global_quote(&quote_json)?;

        tracing::info!(
            "Retrieved {} contracts for {} (spot {})",
            contracts.len(),
            symbol,
            spot_price
        );

        Ok(ChainSnapshot {
            underlying: symbol.clone(),
            expiration,
            spot_price,
            contracts,
            retrieved_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "alpha_vantage",
            "api_key_set": !self.api_key.is_empty()
        })
    }
}
