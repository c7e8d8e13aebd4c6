/// EWMA variance of log returns, seeded at `r1^2` then
/// `sigma2_t = lambda*sigma2_{t-1} + (1-lambda)*r_t^2` (spec §4.3). Returns
/// one variance per return, oldest first.
pub fn ewma_variance(returns: &[f64], lambda: f64) -> Vec<f64> {
    if returns.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(returns.len());
    let mut var = returns[0] * returns[0];
    out.push(var);
    for &r in &returns[1..] {
        var = lambda * var + (1.0 - lambda) * r * r;
        out.push(var);
    }
    out
}

/// `ewmaSigma = sqrt(max(0, sigma2))`.
pub fn sigma(variance: f64) -> f64 {
    variance.max(0.0).sqrt()
}

/// `volPct5m = ewmaSigma * sqrt(5) * 100` (spec §4.3).
pub fn vol_pct_5m(ewma_sigma: f64) -> f64 {
    ewma_sigma * 5f64.sqrt() * 100.0
}

/// `sigmaNorm = latestSigma / max(1e-8, median(window))` (glossary "σ-norm").
pub fn sigma_norm(latest_sigma: f64, window: &[f64]) -> f64 {
    latest_sigma / crate::stats::median(window).max(1e-8)
}
