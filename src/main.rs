use anyhow::Result;
use std::env;
use std::path::Path;

use wallet_view::{
    BalanceSource, CsvBalanceSource, JsonPriceSource, PriceSource, PriceTable, StaticBalances,
    StaticPrices, WalletBalance,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() > 1 && args[1] == "show" {
        // Print mode
        run_show(&args[2..])?;
    } else {
        // UI mode (default); remaining args are snapshot paths
        run_ui_mode(&args[1..])?;
    }

    Ok(())
}

/// Sources from CLI paths (`<balances.csv> [prices.json]`), or the
/// builtin demo snapshot when no paths are given.
fn open_sources(args: &[String]) -> Result<(Box<dyn BalanceSource>, Box<dyn PriceSource>)> {
    let balances: Box<dyn BalanceSource> = match args.first() {
        Some(path) => {
            println!("📂 Loading balances from {}...", path);
            Box::new(CsvBalanceSource::open(Path::new(path))?)
        }
        None => {
            println!("📂 Using builtin demo balances...");
            Box::new(StaticBalances::new(demo_balances()))
        }
    };

    let prices: Box<dyn PriceSource> = match args.get(1) {
        Some(path) => {
            println!("💲 Loading prices from {}...", path);
            Box::new(JsonPriceSource::open(Path::new(path))?)
        }
        None => {
            println!("💲 Using builtin demo prices...");
            Box::new(StaticPrices::new(demo_prices()))
        }
    };

    Ok((balances, prices))
}

fn run_show(args: &[String]) -> Result<()> {
    let (balances, prices) = open_sources(args)?;

    let rows = wallet_view::build(&balances.get(), &prices.get());

    println!();
    println!("{:<16} {:>14} {:>14} {:>10}", "Currency", "Amount", "USD Value", "Priority");
    println!("{}", "─".repeat(58));
    for row in &rows {
        println!(
            "{:<16} {:>14} {:>14} {:>10}",
            row.currency,
            row.formatted,
            format!("${:.2}", row.usd_value),
            row.priority
        );
    }
    println!("{}", "─".repeat(58));

    let total: f64 = rows.iter().map(|row| row.usd_value).sum();
    println!("✓ {} holdings displayed, total ${:.2}", rows.len(), total);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(args: &[String]) -> Result<()> {
    println!("🖥️  Loading wallet view...\n");

    let (balances, prices) = open_sources(args)?;

    let mut app = wallet_view::ui::App::new(balances, prices);
    println!("✓ {} holdings loaded\n", app.rows.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    wallet_view::ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(args: &[String]) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print the table: wallet-view show {}", args.join(" "));
    std::process::exit(1);
}

fn demo_balances() -> Vec<WalletBalance> {
    [
        ("Ethereum", 2.0),
        ("Osmosis", 1.0),
        ("Arbitrum", 12.5),
        ("Zilliqa", 540.0),
        ("Neo", 0.0),
        ("Dogecoin", 1_000.0),
    ]
    .into_iter()
    .map(|(currency, amount)| WalletBalance {
        currency: currency.to_string(),
        amount,
    })
    .collect()
}

fn demo_prices() -> PriceTable {
    [
        ("Ethereum", 3_000.0),
        ("Osmosis", 10.0),
        ("Arbitrum", 1.2),
        ("Dogecoin", 0.07),
    ]
    .into_iter()
    .map(|(currency, price)| (currency.to_string(), price))
    .collect()
}
