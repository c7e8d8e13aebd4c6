//! The composition root (spec §2 `[SUPPLEMENT]` "Runtime Wiring"): builds
//! the bus, the repositories, and all seven pipeline components, then
//! subscribes each component's handler to the bus events the control-flow
//! diagram says it reacts to. Grounded on `mqk-daemon::state::AppState`'s
//! `Arc`-shared-state composition, minus the HTTP/SSE surface (out of
//! scope per SPEC_FULL.md §2).
//!
//! The bus dispatches handlers synchronously (`cdt_bus::Mode::Direct`), but
//! `ExecutionEngine::execute` is `async` (it bounds a real timeout sleep).
//! Rather than block on an async call from inside a sync handler, the
//! `signal.generated` subscriber runs `RiskService::evaluate` (sync) and,
//! on approval, only enqueues the plan; the async `run` loop in `main.rs`
//! drains that queue and drives execution after each ingest tick settles.
//! This is the one place the pipeline's otherwise-uniform bus wiring gives
//! way to an explicit async step, and is recorded as an open decision in
//! DESIGN.md.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use cdt_bus::{Bus, Event, EventName, Mode};
use cdt_db::{
    AuditRepository, InMemoryAuditRepository, InMemoryCandleRepository, InMemoryFeatureRepository,
    InMemoryFillRepository, InMemoryOrderRepository, InMemoryParamVersionRepository,
    InMemoryPositionRepository, InMemoryRegimeRepository, RegimeRepository,
};
use cdt_features::{FeatureConfig, FeatureService};
use cdt_position::{PositionConfig, PositionManager};
use cdt_regime::{RegimeConfig, RegimeEngine};
use cdt_risk::{RiskConfig, RiskOutcome, RiskService};
use cdt_schemas::{ParamVersion, TradePlan};
use cdt_strategy::{Breakout, Continuation, Reversal, StrategyPlanner};
use cdt_testkit::ScriptedBroker;

/// All the in-memory state the pipeline reads and writes. Leaked once at
/// startup (`Box::leak`) so every component can borrow it for `'static`,
/// which is what lets their handler closures satisfy `cdt_bus::Handler`'s
/// implicit `'static` bound without changing any crate's already-built
/// `&'a dyn Trait`-based constructor shape.
pub struct AppState {
    pub bus: Bus,
    pub candles: InMemoryCandleRepository,
    pub features: InMemoryFeatureRepository,
    pub regimes: InMemoryRegimeRepository,
    pub orders: InMemoryOrderRepository,
    pub fills: InMemoryFillRepository,
    pub positions: InMemoryPositionRepository,
    pub audits: InMemoryAuditRepository,
    pub params: InMemoryParamVersionRepository,
    pub broker: ScriptedBroker,
    /// Advanced to the close time of every `candle.closed` seen; stands in
    /// for a wall clock so every downstream handler can timestamp its
    /// audit events from the data itself rather than `SystemTime::now()`.
    pub clock: AtomicI64,
}

impl AppState {
    pub fn new(params_seed: Vec<ParamVersion>) -> Self {
        AppState {
            bus: Bus::new(Mode::Direct, Arc::new(|| 0)),
            candles: InMemoryCandleRepository::new(),
            features: InMemoryFeatureRepository::new(),
            regimes: InMemoryRegimeRepository::new(),
            orders: InMemoryOrderRepository::new(),
            fills: InMemoryFillRepository::new(),
            positions: InMemoryPositionRepository::new(),
            audits: InMemoryAuditRepository::new(),
            params: InMemoryParamVersionRepository::new(params_seed),
            broker: ScriptedBroker::new(true),
            clock: AtomicI64::new(0),
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.load(Ordering::SeqCst)
    }
}

/// One baseline `ParamVersion`, effective from the epoch, used when the
/// operator doesn't supply their own via `--param-version`. `kb`/`ks` match
/// the values `cdt-strategy`'s engine tests use.
pub fn baseline_param_version() -> ParamVersion {
    ParamVersion {
        id: "baseline".to_string(),
        effective_from_ms: 0,
        kb: serde_json::json!(1.5),
        ks: serde_json::json!(1.0),
        leverage_bands: serde_json::json!([]),
        cooldown_rules: serde_json::json!({}),
        portfolio_caps: serde_json::json!({ "max": 3, "maxDefensive": 1 }),
    }
}

/// Plans the risk gate approved, queued here instead of being executed
/// synchronously from inside the bus dispatch (see module docs).
pub type ApprovedQueue = Arc<Mutex<Vec<(TradePlan, f64, f64)>>>;

/// Tracks, per symbol, which position ids are currently `InPosition` — the
/// repositories expose no "list open positions for symbol" query (spec
/// §4.11 only names admission-style lookups), so the composition root
/// keeps this index itself from `position.updated`/`position.closed`.
#[derive(Default)]
struct PositionIndex {
    open_by_symbol: Mutex<HashMap<String, Vec<String>>>,
    last_price_by_symbol: Mutex<HashMap<String, f64>>,
}

/// Subscribes every pipeline component to the bus per the control-flow
/// diagram, and returns the queue the `run` loop drains for execution.
pub fn wire(state: &'static AppState, audit_writer: Arc<Mutex<cdt_audit::AuditWriter>>) -> ApprovedQueue {
    let feature_service = FeatureService {
        candles: &state.candles,
        features: &state.features,
        bus: &state.bus,
        config: FeatureConfig::default(),
    };
    let regime_engine = RegimeEngine::new(&state.regimes, &state.bus, RegimeConfig::default());
    let planner = StrategyPlanner {
        regimes: &state.regimes,
        params: &state.params,
        candles: &state.candles,
        bus: &state.bus,
        breakout: Breakout { config: Default::default() },
        continuation: Continuation { config: Default::default() },
        reversal: Reversal { config: Default::default() },
    };
    let risk_service = RiskService::new(&state.positions, &state.params, &state.bus, RiskConfig::default());
    // `PositionManager` borrows `state` and carries no owned state beyond a
    // `Copy` config, so each subscriber below builds its own cheap instance
    // rather than sharing one value across two `move` closures.
    let position_config = PositionConfig::default();

    let index: &'static PositionIndex = Box::leak(Box::new(PositionIndex::default()));
    let approved: ApprovedQueue = Arc::new(Mutex::new(Vec::new()));

    // candle.closed -> advance the clock, track last price, feed features +
    // the position manager's onPrice.
    state.bus.subscribe(
        EventName::CandleClosed,
        Arc::new(move |event| {
            let Event::CandleClosed(candle) = event else { return Ok(()) };
            state.clock.store(candle.close_time_ms, Ordering::SeqCst);
            index
                .last_price_by_symbol
                .lock()
                .unwrap()
                .insert(candle.symbol.clone(), candle.close);

            feature_service.on_candle_closed(candle, candle.close_time_ms);

            let position_manager = PositionManager {
                positions: &state.positions,
                params: &state.params,
                bus: &state.bus,
                config: position_config,
            };
            let ids = index
                .open_by_symbol
                .lock()
                .unwrap()
                .get(&candle.symbol)
                .cloned()
                .unwrap_or_default();
            for id in ids {
                position_manager.on_price(&id, candle.close, Some(candle.high), Some(candle.low), candle.close_time_ms);
            }
            Ok(())
        }),
    );

    state.bus.subscribe(
        EventName::FeaturesReady,
        Arc::new(move |event| {
            let Event::FeaturesReady(feature) = event else { return Ok(()) };
            regime_engine.on_features_ready(feature);
            planner.on_features_ready(feature, feature.close_time_ms);
            Ok(())
        }),
    );

    state.bus.subscribe(
        EventName::RegimeUpdated,
        Arc::new(move |event| {
            let Event::RegimeUpdated(decision) = event else { return Ok(()) };
            let position_manager = PositionManager {
                positions: &state.positions,
                params: &state.params,
                bus: &state.bus,
                config: position_config,
            };
            let ids = index
                .open_by_symbol
                .lock()
                .unwrap()
                .get(&decision.symbol)
                .cloned()
                .unwrap_or_default();
            let price = index
                .last_price_by_symbol
                .lock()
                .unwrap()
                .get(&decision.symbol)
                .copied()
                .unwrap_or(0.0);
            for id in ids {
                position_manager.on_regime_change(&id, decision.regime, price, decision.close_time_5m_ms);
            }
            Ok(())
        }),
    );

    let approved_for_signal = approved.clone();
    state.bus.subscribe(
        EventName::SignalGenerated,
        Arc::new(move |event| {
            let Event::SignalGenerated(plan) = event else { return Ok(()) };
            let Some(decision) = state.regimes.latest_for_symbol(&plan.symbol) else {
                return Ok(());
            };
            if let RiskOutcome::Approved { qty, final_leverage } =
                risk_service.evaluate(plan, &decision, state.now_ms())
            {
                approved_for_signal.lock().unwrap().push((plan.clone(), qty, final_leverage));
            }
            Ok(())
        }),
    );

    state.bus.subscribe(
        EventName::PositionUpdated,
        Arc::new(move |event| {
            let Event::PositionUpdated(position) = event else { return Ok(()) };
            if position.state == cdt_schemas::PositionState::InPosition {
                let mut map = index.open_by_symbol.lock().unwrap();
                let ids = map.entry(position.symbol.clone()).or_default();
                if !ids.contains(&position.id) {
                    ids.push(position.id.clone());
                }
            }
            Ok(())
        }),
    );

    state.bus.subscribe(
        EventName::PositionClosed,
        Arc::new(move |event| {
            let Event::PositionClosed(payload) = event else { return Ok(()) };
            let mut map = index.open_by_symbol.lock().unwrap();
            for ids in map.values_mut() {
                ids.retain(|id| id != &payload.position_id);
            }
            Ok(())
        }),
    );

    state.bus.subscribe(
        EventName::AuditEvent,
        Arc::new(move |event| {
            let Event::AuditEvent(audit) = event else { return Ok(()) };
            state.audits.append(audit.clone());
            audit_writer
                .lock()
                .unwrap()
                .append(audit.clone())
                .map_err(|e| e.to_string())?;
            Ok(())
        }),
    );

    approved
}
