/// Thresholds and ring-buffer size for regime classification (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeConfig {
    pub window_size: usize,
    pub compression_th: f64,
    pub trend_th: f64,
    pub expansion_th: f64,
    pub defensive_th: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        RegimeConfig {
            window_size: 100,
            compression_th: 25.0,
            trend_th: 65.0,
            expansion_th: 85.0,
            defensive_th: 90.0,
        }
    }
}
