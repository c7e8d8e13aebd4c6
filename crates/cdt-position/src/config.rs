/// Defaults not pinned numerically by the spec (`reduce_risk_on_range_pct`
/// has a stated meaning but no stated default) are this workspace's own
/// choice — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionConfig {
    pub trailing_atr_multiple: f64,
    pub hard_exit_on_expansion_chaos: bool,
    pub hard_exit_on_range: bool,
    pub reduce_risk_on_range_pct: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        PositionConfig {
            trailing_atr_multiple: 1.0,
            hard_exit_on_expansion_chaos: true,
            hard_exit_on_range: false,
            reduce_risk_on_range_pct: 50.0,
        }
    }
}
