//! Static reference table of known tickers: display name and the base price
//! the synthetic generator perturbs.

/// Base price for tickers missing from the table.
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

struct KnownTicker {
    symbol: &'static str,
    name: &'static str,
    base_price: Option<f64>,
}

impl KnownTicker {
    const fn new(symbol: &'static str, name: &'static str, base_price: Option<f64>) -> Self {
        Self {
            symbol,
            name,
            base_price,
        }
    }
}

const KNOWN_TICKERS: &[KnownTicker] = &[
    KnownTicker::new("AAPL", "Apple Inc.", Some(175.0)),
    KnownTicker::new("MSFT", "Microsoft Corporation", Some(340.0)),
    KnownTicker::new("GOOGL", "Alphabet Inc.", Some(140.0)),
    KnownTicker::new("TSLA", "Tesla Inc.", Some(240.0)),
    KnownTicker::new("NVDA", "NVIDIA Corporation", Some(450.0)),
    KnownTicker::new("PETR4.SA", "Petróleo Brasileiro S.A.", Some(32.0)),
    KnownTicker::new("VALE3.SA", "Vale S.A.", Some(85.0)),
    KnownTicker::new("ITUB4.SA", "Itaú Unibanco", Some(29.0)),
    KnownTicker::new("BBDC4.SA", "Bradesco", None),
    KnownTicker::new("ABEV3.SA", "Ambev", None),
    KnownTicker::new("MGLU3.SA", "Magazine Luiza", None),
    KnownTicker::new("WEGE3.SA", "WEG", None),
];

fn lookup(symbol: &str) -> Option<&'static KnownTicker> {
    KNOWN_TICKERS.iter().find(|t| t.symbol == symbol)
}

/// Display name from the reference table, if known.
pub fn company_name(symbol: &str) -> Option<&'static str> {
    lookup(symbol).map(|t| t.name)
}

/// Display name, falling back to the symbol itself.
pub fn display_name(symbol: &str) -> String {
    company_name(symbol).unwrap_or(symbol).to_string()
}

/// Base price for synthetic quotes.
pub fn base_price(symbol: &str) -> f64 {
    lookup(symbol)
        .and_then(|t| t.base_price)
        .unwrap_or(DEFAULT_BASE_PRICE)
}
