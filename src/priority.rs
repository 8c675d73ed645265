// 🏷️ Priority Classification - Rules as Data
// Maps currency identifiers to display ranks; everything else is UNKNOWN_PRIORITY

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Sentinel rank for currencies outside the known set.
///
/// Named rather than inlined so the filter predicate cannot silently
/// drift if the known-currency set grows.
pub const UNKNOWN_PRIORITY: i32 = -99;

// ============================================================================
// RULE DEFINITION
// ============================================================================

/// One currency -> rank entry, loadable from a JSON rules file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityRule {
    /// Currency identifier, matched exactly
    pub currency: String,

    /// Display rank (higher = shown first)
    pub priority: i32,
}

// ============================================================================
// PRIORITY TABLE
// ============================================================================

/// Constant-time currency -> rank lookup.
///
/// Built once (the builtin table is process-wide), never reconstructed
/// per classification call.
pub struct PriorityTable {
    ranks: HashMap<String, i32>,
}

impl PriorityTable {
    /// Create a table from a list of rules.
    /// Later rules win on duplicate currencies.
    pub fn from_rules(rules: Vec<PriorityRule>) -> Self {
        let ranks = rules
            .into_iter()
            .map(|rule| (rule.currency, rule.priority))
            .collect();
        PriorityTable { ranks }
    }

    /// Load rules from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read priority rules file: {:?}", path.as_ref()))?;

        let rules: Vec<PriorityRule> =
            serde_json::from_str(&content).context("Failed to parse priority rules JSON")?;

        Ok(PriorityTable::from_rules(rules))
    }

    /// The builtin ranking, constructed on first use and shared thereafter.
    pub fn builtin() -> &'static PriorityTable {
        static BUILTIN: OnceLock<PriorityTable> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            PriorityTable::from_rules(vec![
                rule("Osmosis", 100),
                rule("Ethereum", 50),
                rule("Arbitrum", 30),
                rule("Zilliqa", 20),
                rule("Neo", 20),
            ])
        })
    }

    /// Rank for a currency; `UNKNOWN_PRIORITY` for anything outside the table.
    pub fn classify(&self, currency: &str) -> i32 {
        self.ranks.get(currency).copied().unwrap_or(UNKNOWN_PRIORITY)
    }

    /// Number of known currencies.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}

fn rule(currency: &str, priority: i32) -> PriorityRule {
    PriorityRule {
        currency: currency.to_string(),
        priority,
    }
}

/// Classify against the builtin table.
pub fn classify(currency: &str) -> i32 {
    PriorityTable::builtin().classify(currency)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_currencies_rank_above_sentinel() {
        for currency in ["Osmosis", "Ethereum", "Arbitrum", "Zilliqa", "Neo"] {
            assert!(
                classify(currency) > UNKNOWN_PRIORITY,
                "{} should outrank the sentinel",
                currency
            );
        }
    }

    #[test]
    fn test_builtin_ranking() {
        assert_eq!(classify("Osmosis"), 100);
        assert_eq!(classify("Ethereum"), 50);
        assert_eq!(classify("Arbitrum"), 30);
        assert_eq!(classify("Zilliqa"), 20);
        assert_eq!(classify("Neo"), 20);
    }

    #[test]
    fn test_unknown_currency_is_exactly_sentinel() {
        assert_eq!(classify("Dogecoin"), UNKNOWN_PRIORITY);
        assert_eq!(classify(""), UNKNOWN_PRIORITY);
        assert_eq!(classify("osmosis"), UNKNOWN_PRIORITY); // case-sensitive
    }

    #[test]
    fn test_builtin_is_shared() {
        let a = PriorityTable::builtin() as *const PriorityTable;
        let b = PriorityTable::builtin() as *const PriorityTable;
        assert_eq!(a, b);
    }

    #[test]
    fn test_later_rules_win_on_duplicates() {
        let table = PriorityTable::from_rules(vec![rule("Neo", 20), rule("Neo", 45)]);
        assert_eq!(table.classify("Neo"), 45);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_rules_json() {
        let rules: Vec<PriorityRule> =
            serde_json::from_str(r#"[{"currency": "Osmosis", "priority": 100}]"#).unwrap();
        let table = PriorityTable::from_rules(rules);
        assert_eq!(table.classify("Osmosis"), 100);
        assert_eq!(table.classify("Ethereum"), UNKNOWN_PRIORITY);
    }
}
