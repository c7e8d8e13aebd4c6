/// Defaults not pinned numerically by the spec (`equity`, `max_leverage_defensive`,
/// `qty_step`, `min_qty`, default `max_open`/`max_open_defensive` when a
/// `ParamVersion`'s `portfolio_caps` blob doesn't carry them) are this
/// workspace's own choice — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    pub per_symbol_cooldown_ms: i64,
    pub per_engine_cooldown_ms: i64,
    pub max_leverage_defensive: f64,
    pub equity: f64,
    pub qty_step: f64,
    pub min_qty: f64,
    pub default_max_open: u64,
    pub default_max_open_defensive: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            per_symbol_cooldown_ms: 5 * 60_000,
            per_engine_cooldown_ms: 2 * 60_000,
            max_leverage_defensive: 2.0,
            equity: 10_000.0,
            qty_step: 0.001,
            min_qty: 0.001,
            default_max_open: 3,
            default_max_open_defensive: 1,
        }
    }
}
