/// Median of `values`. Empty input yields `0.0` (callers apply the `1e-8`
/// floor downstream, e.g. [`crate::ewma::sigma_norm`]).
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `percentileRank(sample, v) = (count of values <= v)/|sample| * 100`
/// (spec §4.3) — ties are counted inclusively, per the numeric-safety note
/// in spec §9 ("percentile ranks use a <= comparison for ties").
pub fn percentile_rank(sample: &[f64], v: f64) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let count = sample.iter().filter(|&&x| x <= v).count();
    count as f64 / sample.len() as f64 * 100.0
}
