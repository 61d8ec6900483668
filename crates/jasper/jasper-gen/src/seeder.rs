//! Static reference data for seeding subscriptions.

use basalt_events::SecurityId;

pub struct EquityInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub base_price: f64,
}

/// Major US equities with realistic reference prices. The table is small and
/// scanned linearly; it is consulted once per subscribe, never on the hot
/// path.
pub const EQUITIES: &[EquityInfo] = &[
    EquityInfo { symbol: "AAPL", name: "Apple Inc.", base_price: 175.0 },
    EquityInfo { symbol: "MSFT", name: "Microsoft Corporation", base_price: 350.0 },
    EquityInfo { symbol: "GOOGL", name: "Alphabet Inc.", base_price: 2800.0 },
    EquityInfo { symbol: "AMZN", name: "Amazon.com Inc.", base_price: 3200.0 },
    EquityInfo { symbol: "TSLA", name: "Tesla Inc.", base_price: 250.0 },
    EquityInfo { symbol: "META", name: "Meta Platforms Inc.", base_price: 320.0 },
    EquityInfo { symbol: "NVDA", name: "NVIDIA Corporation", base_price: 450.0 },
    EquityInfo { symbol: "JPM", name: "JPMorgan Chase & Co.", base_price: 145.0 },
    EquityInfo { symbol: "JNJ", name: "Johnson & Johnson", base_price: 165.0 },
    EquityInfo { symbol: "V", name: "Visa Inc.", base_price: 240.0 },
    EquityInfo { symbol: "PG", name: "Procter & Gamble Co.", base_price: 140.0 },
    EquityInfo { symbol: "UNH", name: "UnitedHealth Group Inc.", base_price: 520.0 },
    EquityInfo { symbol: "HD", name: "Home Depot Inc.", base_price: 330.0 },
    EquityInfo { symbol: "MA", name: "Mastercard Inc.", base_price: 380.0 },
    EquityInfo { symbol: "BAC", name: "Bank of America Corp.", base_price: 32.0 },
    EquityInfo { symbol: "XOM", name: "Exxon Mobil Corporation", base_price: 110.0 },
    EquityInfo { symbol: "DIS", name: "Walt Disney Co.", base_price: 95.0 },
    EquityInfo { symbol: "ADBE", name: "Adobe Inc.", base_price: 480.0 },
    EquityInfo { symbol: "CRM", name: "Salesforce Inc.", base_price: 220.0 },
    EquityInfo { symbol: "NFLX", name: "Netflix Inc.", base_price: 450.0 },
];

/// Reference price for `symbol`, or `default` for unknown symbols.
pub fn base_price(symbol: &str, default: f64) -> f64 {
    EQUITIES
        .iter()
        .find(|e| e.symbol == symbol)
        .map(|e| e.base_price)
        .unwrap_or(default)
}

pub fn major_us_equities() -> Vec<SecurityId> {
    EQUITIES.iter().map(|e| SecurityId::new(e.symbol)).collect()
}

/// A smaller fixed set for tests and demos.
pub fn test_securities() -> Vec<SecurityId> {
    EQUITIES
        .iter()
        .take(10)
        .map(|e| SecurityId::new(e.symbol))
        .collect()
}
