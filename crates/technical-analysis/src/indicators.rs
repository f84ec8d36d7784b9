use analysis_core::Bar;

/// RSI returned when there are not enough closes to compute one.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
///
/// The first value is emitted once `period` changes are available, so the
/// output has `data.len() - period` entries.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;

    let mut rsi_values = Vec::with_capacity(data.len() - period);
    rsi_values.push(rsi_from_averages(avg_gain, avg_loss));

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Latest RSI value, or [`NEUTRAL_RSI`] with too little history
pub fn latest_rsi(data: &[f64], period: usize) -> f64 {
    rsi(data, period).last().copied().unwrap_or(NEUTRAL_RSI)
}

/// Mean high-low range over the last `period` bars
pub fn average_range(bars: &[Bar], period: usize) -> Option<f64> {
    if period == 0 || bars.len() < period {
        return None;
    }
    let window = &bars[bars.len() - period..];
    Some(window.iter().map(|b| b.high - b.low).sum::<f64>() / period as f64)
}

/// Least-squares slope of the last `period` closes, normalised by their mean price
pub fn normalized_slope(closes: &[f64], period: usize) -> f64 {
    if period < 2 || closes.len() < period {
        return 0.0;
    }

    let recent = &closes[closes.len() - period..];
    let n = period as f64;
    let sum_x: f64 = (0..period).map(|i| i as f64).sum();
    let sum_y: f64 = recent.iter().sum();
    let sum_xy: f64 = recent.iter().enumerate().map(|(i, y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..period).map(|i| (i * i) as f64).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    let avg_price = sum_y / n;
    if denom == 0.0 || avg_price == 0.0 {
        return 0.0;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    slope / avg_price
}
