// Snapshot sources: the external collaborators the view model consumes
// Sources hand out Arc-shared immutable snapshots; a new Arc signals a change

use crate::model::{PriceTable, WalletBalance};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Supplies the current balance snapshot, already resolved.
/// The fetch lifecycle behind the snapshot is the source's own concern.
pub trait BalanceSource {
    fn get(&self) -> Arc<Vec<WalletBalance>>;

    /// Refresh the snapshot from the backing store, if any.
    fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Supplies the current price table, already resolved.
/// May omit currencies that are not yet priced.
pub trait PriceSource {
    fn get(&self) -> Arc<PriceTable>;

    fn reload(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY SNAPSHOTS
// ============================================================================

/// Fixed balance snapshot, for demos and tests.
pub struct StaticBalances {
    snapshot: Arc<Vec<WalletBalance>>,
}

impl StaticBalances {
    pub fn new(balances: Vec<WalletBalance>) -> Self {
        StaticBalances {
            snapshot: Arc::new(balances),
        }
    }

    /// Replace the snapshot. The next `get` hands out a new identity,
    /// which is what triggers a view-model rebuild downstream.
    pub fn replace(&mut self, balances: Vec<WalletBalance>) {
        self.snapshot = Arc::new(balances);
    }
}

impl BalanceSource for StaticBalances {
    fn get(&self) -> Arc<Vec<WalletBalance>> {
        Arc::clone(&self.snapshot)
    }
}

/// Fixed price table, for demos and tests.
pub struct StaticPrices {
    snapshot: Arc<PriceTable>,
}

impl StaticPrices {
    pub fn new(prices: PriceTable) -> Self {
        StaticPrices {
            snapshot: Arc::new(prices),
        }
    }

    pub fn replace(&mut self, prices: PriceTable) {
        self.snapshot = Arc::new(prices);
    }
}

impl PriceSource for StaticPrices {
    fn get(&self) -> Arc<PriceTable> {
        Arc::clone(&self.snapshot)
    }
}

// ============================================================================
// FILE-BACKED SNAPSHOTS
// ============================================================================

/// Load a balance snapshot from a CSV file with `Currency,Amount` headers.
pub fn load_balances_csv(csv_path: &Path) -> Result<Vec<WalletBalance>> {
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open balances CSV: {:?}", csv_path))?;

    let mut balances = Vec::new();

    for result in rdr.deserialize() {
        let balance: WalletBalance = result.context("Failed to deserialize balance row")?;
        balances.push(balance);
    }

    Ok(balances)
}

/// Load a price table from a JSON object of `{"Currency": price}` entries.
pub fn load_prices_json(json_path: &Path) -> Result<PriceTable> {
    let content = fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read prices file: {:?}", json_path))?;

    let prices: PriceTable =
        serde_json::from_str(&content).context("Failed to parse prices JSON")?;

    Ok(prices)
}

/// Balance source backed by a CSV file, re-read on `reload`.
pub struct CsvBalanceSource {
    path: std::path::PathBuf,
    snapshot: Arc<Vec<WalletBalance>>,
}

impl CsvBalanceSource {
    pub fn open(path: &Path) -> Result<Self> {
        let balances = load_balances_csv(path)?;
        Ok(CsvBalanceSource {
            path: path.to_path_buf(),
            snapshot: Arc::new(balances),
        })
    }
}

impl BalanceSource for CsvBalanceSource {
    fn get(&self) -> Arc<Vec<WalletBalance>> {
        Arc::clone(&self.snapshot)
    }

    /// Re-read the file and swap in a fresh snapshot.
    fn reload(&mut self) -> Result<()> {
        self.snapshot = Arc::new(load_balances_csv(&self.path)?);
        Ok(())
    }
}

/// Price source backed by a JSON file, re-read on `reload`.
pub struct JsonPriceSource {
    path: std::path::PathBuf,
    snapshot: Arc<PriceTable>,
}

impl JsonPriceSource {
    pub fn open(path: &Path) -> Result<Self> {
        let prices = load_prices_json(path)?;
        Ok(JsonPriceSource {
            path: path.to_path_buf(),
            snapshot: Arc::new(prices),
        })
    }
}

impl PriceSource for JsonPriceSource {
    fn get(&self) -> Arc<PriceTable> {
        Arc::clone(&self.snapshot)
    }

    fn reload(&mut self) -> Result<()> {
        self.snapshot = Arc::new(load_prices_json(&self.path)?);
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_static_source_identity_is_stable_until_replaced() {
        let mut source = StaticBalances::new(vec![WalletBalance {
            currency: "Osmosis".to_string(),
            amount: 1.0,
        }]);

        let first = source.get();
        let second = source.get();
        assert!(Arc::ptr_eq(&first, &second));

        source.replace(vec![]);
        let third = source.get();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_load_balances_csv() {
        let dir = std::env::temp_dir();
        let path = dir.join("wallet_view_test_balances.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Currency,Amount").unwrap();
        writeln!(file, "Ethereum,2.0").unwrap();
        writeln!(file, "Osmosis,1.5").unwrap();
        drop(file);

        let balances = load_balances_csv(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].currency, "Ethereum");
        assert_eq!(balances[0].amount, 2.0);
        assert_eq!(balances[1].currency, "Osmosis");
        assert_eq!(balances[1].amount, 1.5);
    }

    #[test]
    fn test_load_prices_json() {
        let dir = std::env::temp_dir();
        let path = dir.join("wallet_view_test_prices.json");
        fs::write(&path, r#"{"Ethereum": 3000.0, "Osmosis": 10.0}"#).unwrap();

        let prices = load_prices_json(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(prices.get("Ethereum"), Some(&3000.0));
        assert_eq!(prices.get("Osmosis"), Some(&10.0));
        assert_eq!(prices.get("Dogecoin"), None);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = Path::new("/nonexistent/wallet_view/balances.csv");
        assert!(load_balances_csv(path).is_err());
        assert!(load_prices_json(Path::new("/nonexistent/wallet_view/p.json")).is_err());
    }
}
