use std::time::Duration as StdDuration;

use analysis_core::{
    AnalysisError, Bar, BarSource, EconomicProvider, EconomicSnapshot, HardDataProvider,
    HardDataSnapshot, PriceSnapshot,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::symbols::normalize_symbol;

pub const DEFAULT_CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(15);

/// Calendar days of bars fetched for the price snapshot
const PRICE_LOOKBACK_DAYS: i64 = 45;
/// Prior bars averaged for the volume baseline
const AVERAGE_VOLUME_BARS: usize = 20;
/// Calendar days fetched for the macro series (covers long weekends)
const MACRO_LOOKBACK_DAYS: i64 = 10;

const VIX_SYMBOL: &str = "^VIX";
/// 10-year treasury yield, percent
const LONG_YIELD_SYMBOL: &str = "^TNX";
/// 13-week treasury bill yield, percent
const SHORT_YIELD_SYMBOL: &str = "^IRX";

/// Yahoo v8 chart client. Serves daily bars, a price snapshot for the
/// hard-data layer and VIX / yield-curve proxies for the economic layer.
#[derive(Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
    chart_url: String,
    exchange_suffix: Option<String>,
}

impl YahooFinanceClient {
    pub fn new(chart_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build Yahoo HTTP client")?;

        Ok(Self {
            client,
            chart_url: chart_url.into().trim_end_matches('/').to_string(),
            exchange_suffix: None,
        })
    }

    /// Exchange suffix appended to bare tickers, e.g. `.IS`
    pub fn with_exchange_suffix(mut self, suffix: Option<String>) -> Self {
        self.exchange_suffix = suffix;
        self
    }

    pub fn chart_url(&self) -> &str {
        &self.chart_url
    }

    fn normalize(&self, symbol: &str) -> String {
        normalize_symbol(symbol, self.exchange_suffix.as_deref())
    }

    fn request_url(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>, interval: &str) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval={}",
            self.chart_url,
            symbol,
            start.timestamp(),
            end.timestamp(),
            interval
        )
    }

    /// Historical bars for an already-normalised symbol
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval: &str,
    ) -> Result<Vec<Bar>> {
        let url = self.request_url(symbol, start, end, interval);
        tracing::debug!("Fetching Yahoo chart {}", url);

        let json: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("chart request for {symbol} failed"))?
            .error_for_status()
            .with_context(|| format!("chart request for {symbol} rejected"))?
            .json()
            .await
            .with_context(|| format!("chart response for {symbol} is not JSON"))?;

        parse_chart(&json).with_context(|| format!("unreadable chart for {symbol}"))
    }

    async fn last_close(&self, symbol: &str, now: DateTime<Utc>) -> Result<f64> {
        let bars = self
            .get_historical_data(symbol, now - Duration::days(MACRO_LOOKBACK_DAYS), now, "1d")
            .await?;
        bars.last()
            .map(|b| b.close)
            .ok_or_else(|| anyhow!("no recent bars for {symbol}"))
    }
}

fn api_error(err: anyhow::Error) -> AnalysisError {
    AnalysisError::ApiError(format!("{err:#}"))
}

/// Parse a v8 chart payload into bars, skipping rows with null fields.
pub fn parse_chart(json: &serde_json::Value) -> Result<Vec<Bar>> {
    if let Some(message) = json
        .pointer("/chart/error/description")
        .and_then(|v| v.as_str())
    {
        return Err(anyhow!("Yahoo error: {message}"));
    }

    let chart = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| anyhow!("No chart data found"))?;

    // A symbol with no trades in range has no timestamp array at all
    let Some(timestamps) = chart.get("timestamp").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let quotes = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| anyhow!("No quote data found"))?;

    let series = |name: &str| {
        quotes
            .get(name)
            .and_then(|v| v.as_array())
            .ok_or_else(|| anyhow!("No {name} series"))
    };
    let opens = series("open")?;
    let highs = series("high")?;
    let lows = series("low")?;
    let closes = series("close")?;
    let volumes = series("volume")?;

    let at = |values: &Vec<serde_json::Value>, i: usize| values.get(i).and_then(|v| v.as_f64());

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        if let (Some(ts), Some(open), Some(high), Some(low), Some(close)) = (
            ts.as_i64(),
            at(opens, i),
            at(highs, i),
            at(lows, i),
            at(closes, i),
        ) {
            bars.push(Bar {
                timestamp: DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("Invalid timestamp {ts}"))?,
                open,
                high,
                low,
                close,
                volume: at(volumes, i).unwrap_or(0.0),
            });
        }
    }

    Ok(bars)
}

/// Latest close, day change and volume against the prior-bar average.
pub fn price_snapshot(bars: &[Bar]) -> Option<PriceSnapshot> {
    let [.., previous, last] = bars else {
        return None;
    };
    if previous.close <= 0.0 {
        return None;
    }

    let prior = &bars[..bars.len() - 1];
    let window = &prior[prior.len().saturating_sub(AVERAGE_VOLUME_BARS)..];
    let average_volume = (!window.is_empty())
        .then(|| window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64)
        .filter(|v| *v > 0.0);

    Some(PriceSnapshot {
        price: last.close,
        change_percent: (last.close - previous.close) / previous.close * 100.0,
        volume: last.volume,
        average_volume,
    })
}

#[async_trait]
impl BarSource for YahooFinanceClient {
    async fn daily_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let symbol = self.normalize(symbol);
        self.get_historical_data(&symbol, start, end, "1d")
            .await
            .map_err(api_error)
    }
}

#[async_trait]
impl HardDataProvider for YahooFinanceClient {
    /// Only the price record is available from chart data; order flow,
    /// options and dark pool stay empty.
    async fn fetch_hard_data(&self, symbol: &str) -> Result<HardDataSnapshot, AnalysisError> {
        let now = Utc::now();
        let bars = self
            .daily_bars(symbol, now - Duration::days(PRICE_LOOKBACK_DAYS), now)
            .await?;

        Ok(HardDataSnapshot {
            price: price_snapshot(&bars),
            ..Default::default()
        })
    }
}

#[async_trait]
impl EconomicProvider for YahooFinanceClient {
    async fn fetch_economic(&self) -> Result<EconomicSnapshot, AnalysisError> {
        let now = Utc::now();
        let (vix, long_yield, short_yield) = tokio::join!(
            self.last_close(VIX_SYMBOL, now),
            self.last_close(LONG_YIELD_SYMBOL, now),
            self.last_close(SHORT_YIELD_SYMBOL, now),
        );

        if let (Err(e), Err(_), Err(_)) = (&vix, &long_yield, &short_yield) {
            return Err(AnalysisError::ProviderUnavailable(format!("macro series unavailable: {e:#}")));
        }

        for (name, result) in [(VIX_SYMBOL, &vix), (LONG_YIELD_SYMBOL, &long_yield), (SHORT_YIELD_SYMBOL, &short_yield)] {
            if let Err(e) = result {
                tracing::warn!("Macro series {} unavailable: {:#}", name, e);
            }
        }

        let yield_curve = match (&long_yield, &short_yield) {
            (Ok(long), Ok(short)) => Some(long - short),
            _ => None,
        };

        Ok(EconomicSnapshot {
            vix: vix.ok(),
            yield_curve,
            ..Default::default()
        })
    }
}
