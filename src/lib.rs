// Wallet View - Core Library
// Turns raw wallet balances into an ordered, annotated display list

pub mod model;
pub mod priority;
pub mod sources;
pub mod view_model;

// Only compile the renderer when the TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use model::{DisplayBalance, PriceTable, WalletBalance};
pub use priority::{classify, PriorityRule, PriorityTable, UNKNOWN_PRIORITY};
pub use sources::{
    load_balances_csv, load_prices_json, BalanceSource, CsvBalanceSource, JsonPriceSource,
    PriceSource, StaticBalances, StaticPrices,
};
pub use view_model::{build, build_with_table, ViewModelCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
