use serde::{Deserialize, Serialize};

/// Market regime classification (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Compression,
    Trend,
    Range,
    ExpansionChaos,
}

/// Which strategy engine owns entries for the current regime (spec §4.4, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    Breakout,
    Continuation,
    Reversal,
    Defensive,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Engine::Breakout => "Breakout",
            Engine::Continuation => "Continuation",
            Engine::Reversal => "Reversal",
            Engine::Defensive => "Defensive",
        };
        write!(f, "{s}")
    }
}

/// One per (symbol, 5m closeTime) (spec §3 "RegimeDecision").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDecision {
    pub symbol: String,
    pub close_time_5m_ms: i64,
    pub regime: Regime,
    pub engine: Engine,
    pub defensive: bool,
}

impl RegimeDecision {
    /// `defensive ⇒ engine == Defensive`.
    pub fn is_valid(&self) -> bool {
        !self.defensive || matches!(self.engine, Engine::Defensive)
    }

    pub fn engine_for(regime: Regime, defensive: bool) -> Engine {
        if defensive {
            return Engine::Defensive;
        }
        match regime {
            Regime::Compression => Engine::Breakout,
            Regime::Trend => Engine::Continuation,
            Regime::Range => Engine::Reversal,
            Regime::ExpansionChaos => Engine::Defensive,
        }
    }
}
