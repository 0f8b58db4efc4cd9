use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents an underlying symbol with exchange information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub symbol: String,
    pub exchange: String,
    pub asset_class: AssetClass,
}

impl Symbol {
    pub fn new(symbol: &str, exchange: &str, asset_class: AssetClass) -> Self {
        Self {
            symbol: symbol.to_string(),
            exchange: exchange.to_string(),
            asset_class,
        }
    }

    pub fn equity(symbol: &str) -> Self {
        Self::new(symbol, "NSE", AssetClass::Equity)
    }

    pub fn index(symbol: &str) -> Self {
        Self::new(symbol, "NSE", AssetClass::Index)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

/// Asset classes with listed option chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Equity,
    Index,
}

impl AssetClass {
    /// Returns true when contracts on this class settle in cash rather than
    /// by delivery of the underlying.
    pub fn is_cash_settled(&self) -> bool {
        matches!(self, AssetClass::Index)
    }

    /// Default exchange identifier for this asset class.
    pub fn default_exchange(&self) -> &'static str {
        match self {
            AssetClass::Equity => "NSE",
            AssetClass::Index => "NSE",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetClass::Equity => "Equity",
            AssetClass::Index => "Index",
        };
        write!(f, "{}", s)
    }
}
