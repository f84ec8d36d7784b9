//! Concrete data collaborators: Yahoo chart data (bars, price snapshot,
//! macro proxies) and an HTTP JSON source for behavioral indicators.

pub mod behavioral;
pub mod symbols;
pub mod yahoo_finance;

pub use behavioral::HttpBehavioralProvider;
pub use symbols::normalize_symbol;
pub use yahoo_finance::{YahooFinanceClient, DEFAULT_CHART_URL};
