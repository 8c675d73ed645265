// Data model: raw balances in, display records out
// Display records are constructed fresh on every rebuild and never mutated

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw holding as reported by the balance source.
/// Immutable once read; `currency` is unique within a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    #[serde(rename = "Currency", alias = "currency")]
    pub currency: String,

    #[serde(rename = "Amount", alias = "amount")]
    pub amount: f64,
}

/// Currency identifier -> unit price in USD.
/// An absent key means the price is not yet known.
pub type PriceTable = HashMap<String, f64>;

/// Balance enriched with computed display and sort fields.
///
/// Owned solely by the view-model builder's output: constructed in one
/// pass, discarded wholesale when superseded by the next rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayBalance {
    /// Stable row identity for the renderer (never positional index).
    pub currency: String,

    /// Raw amount as reported by the balance source.
    pub amount: f64,

    /// Sort rank; higher sorts first. See `priority::UNKNOWN_PRIORITY`.
    pub priority: i32,

    /// Amount pre-formatted with exactly 2 fractional digits.
    pub formatted: String,

    /// `amount * price`, with price defaulting to 0 when unknown.
    pub usd_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_deserializes_csv_style_headers() {
        let balance: WalletBalance =
            serde_json::from_str(r#"{"Currency": "Ethereum", "Amount": 2.5}"#).unwrap();
        assert_eq!(balance.currency, "Ethereum");
        assert_eq!(balance.amount, 2.5);
    }

    #[test]
    fn test_balance_deserializes_lowercase_aliases() {
        let balance: WalletBalance =
            serde_json::from_str(r#"{"currency": "Osmosis", "amount": 1.0}"#).unwrap();
        assert_eq!(balance.currency, "Osmosis");
        assert_eq!(balance.amount, 1.0);
    }
}
