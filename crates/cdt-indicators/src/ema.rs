/// EMA series seeded by the SMA of the first `period` values, then
/// recurrence with `k = 2/(period+1)` (spec §4.3, glossary "EMA(p)"). Output
/// is one entry per input value from index `period - 1` onward.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period + 1) as f64;
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !seed.is_finite() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(values.len() - period + 1);
    out.push(seed);
    let mut prev = seed;
    for &v in &values[period..] {
        let next = v * k + prev * (1.0 - k);
        if !next.is_finite() {
            break;
        }
        out.push(next);
        prev = next;
    }
    out
}

/// `ema50Slope = (EMA50_t - EMA50_{t-5}) / max(1e-8, EMA50_{t-5})` (spec
/// §4.3). `series` is an EMA output (oldest first); `None` if it has fewer
/// than 6 points.
pub fn slope_over(series: &[f64], lag: usize) -> Option<f64> {
    if series.len() <= lag {
        return None;
    }
    let t = series[series.len() - 1];
    let t_lag = series[series.len() - 1 - lag];
    Some((t - t_lag) / t_lag.abs().max(1e-8))
}
