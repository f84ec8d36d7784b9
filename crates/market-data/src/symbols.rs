/// Longest bare ticker that still gets the exchange suffix
const MAX_BARE_TICKER_LEN: usize = 5;

/// Upper-case and trim a ticker, appending `suffix` (e.g. `.IS`) to bare
/// exchange tickers. Symbols already carrying an exchange, crypto pairs
/// and index/futures notation (`^VIX`, `ES=F`) are left alone.
pub fn normalize_symbol(symbol: &str, suffix: Option<&str>) -> String {
    let symbol = symbol.trim().to_uppercase();
    let Some(suffix) = suffix.map(str::trim).filter(|s| !s.is_empty()) else {
        return symbol;
    };

    let bare = symbol.len() <= MAX_BARE_TICKER_LEN
        && !symbol.contains('.')
        && !symbol.contains("USD")
        && !symbol.starts_with('^')
        && !symbol.contains('=');
    if bare && !symbol.is_empty() {
        format!("{}{}", symbol, suffix.to_uppercase())
    } else {
        symbol
    }
}
