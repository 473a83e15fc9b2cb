// Integration tests for chain universe selection
// These drive the selection model through the simulated host engine

use crate::{
    AssetClass, ChainUniverseSelectionModel, ContractFilterSpec, InMemoryPriceHistory,
    InstrumentId, InsightDirection, PriceBar, Resolution, RsiAlphaModel, SecurityRegistry,
    SelectionError, SimulatedEngine, StaticSelector, UniverseSelectionModel, UniverseSettings,
};
use rust_decimal::Decimal;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 14, 30, 0).unwrap()
}

fn contract(root: &str, year: i32, month: u32, day: u32) -> InstrumentId {
    InstrumentId::future_contract(root, "CME", NaiveDate::from_ymd_opt(year, month, day).unwrap())
}

fn create_test_engine() -> SimulatedEngine {
    SimulatedEngine::new(t0(), UniverseSettings::default())
}

/// End-to-end: one concrete ES contract selected on a daily refresh
#[test]
fn test_es_chain_end_to_end() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![InstrumentId::future("ES", "CME")]),
    )
    .unwrap();

    let first = model.create_universes(&mut engine.context()).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].symbol(), &InstrumentId::canonical(AssetClass::Future, "ES", "CME"));
    assert_eq!(first[0].symbol().raw_value, "/ES");
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));

    // The host decides the polling cadence; an early call still re-runs selection
    engine.advance(Duration::hours(2));
    let second = model.create_universes(&mut engine.context()).unwrap();
    assert_eq!(second.len(), 1);
    assert!(Arc::ptr_eq(&first[0].security, &second[0].security));
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::hours(2) + Duration::days(1));
    assert_eq!(engine.securities().creations(), 1);
    assert_eq!(engine.subscriptions().configs().len(), 1);
}

#[test]
fn test_duplicate_candidates_yield_one_universe_per_chain() {
    let mut engine = create_test_engine();
    let es_dec = contract("ES", 2025, 12, 19);
    let nq_dec = contract("NQ", 2025, 12, 19);
    let es_mar = contract("ES", 2026, 3, 20);
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![es_dec.clone(), nq_dec, es_mar, es_dec]),
    )
    .unwrap();

    let universes = model.create_universes(&mut engine.context()).unwrap();
    let roots: Vec<&str> = universes.iter().map(|u| u.symbol().raw_value.as_str()).collect();

    // First-seen order, duplicates dropped silently
    assert_eq!(roots, vec!["/ES", "/NQ"]);
    assert_eq!(engine.securities().len(), 2);

    let metrics = model.metrics();
    assert_eq!(metrics.candidates_seen, 4);
    assert_eq!(metrics.duplicates_dropped, 2);
    assert_eq!(metrics.universes_emitted, 2);
}

#[test]
fn test_canonical_and_concrete_candidates_share_a_chain() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![
            InstrumentId::canonical(AssetClass::Future, "ES", "CME"),
            contract("ES", 2025, 12, 19),
        ]),
    )
    .unwrap();

    let universes = model.create_universes(&mut engine.context()).unwrap();
    assert_eq!(universes.len(), 1);
}

#[test]
fn test_wrong_asset_class_fails_cycle_without_side_effects() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![
            InstrumentId::future("ES", "CME"),
            InstrumentId::new(AssetClass::Equity, "SPY", "USA", None, false),
        ]),
    )
    .unwrap();

    let err = model.create_universes(&mut engine.context()).unwrap_err();
    assert!(err.is_invalid_argument());

    // Schedule already advanced; nothing provisioned
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::days(1));
    assert!(engine.securities().is_empty());
    let es_chain = InstrumentId::canonical(AssetClass::Future, "ES", "CME");
    assert!(!engine.securities().contains(&es_chain));
    assert!(engine.subscriptions().configs().is_empty());

    let metrics = model.metrics();
    assert_eq!(metrics.failed_cycles, 1);
    assert_eq!(metrics.candidates_seen, 2);
    assert_eq!(metrics.universes_emitted, 0);
}

#[test]
fn test_configured_asset_class_is_enforced() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![InstrumentId::future("ES", "CME")]),
    )
    .unwrap()
    .with_asset_class(AssetClass::FutureOption);

    let err = model.create_universes(&mut engine.context()).unwrap_err();
    match err {
        SelectionError::InvalidArgument { expected, actual, .. } => {
            assert_eq!(expected, AssetClass::FutureOption);
            assert_eq!(actual, AssetClass::Future);
        }
        other => panic!("Expected InvalidArgument, got {other:?}"),
    }
}

#[test]
fn test_selector_failure_still_advances_schedule() {
    let mut engine = create_test_engine();
    let selector = |_: DateTime<Utc>| -> anyhow::Result<Vec<InstrumentId>> {
        Err(anyhow::anyhow!("universe file unavailable"))
    };
    let mut model = ChainUniverseSelectionModel::new(Duration::hours(6), selector).unwrap();

    let err = model.create_universes(&mut engine.context()).unwrap_err();
    assert!(matches!(err, SelectionError::Selector(_)));
    assert_eq!(model.next_refresh_time_utc(), t0() + Duration::hours(6));
}

#[test]
fn test_negative_refresh_interval_is_rejected() {
    let selector = StaticSelector::new(vec![InstrumentId::future("ES", "CME")]);
    let result = ChainUniverseSelectionModel::new(Duration::hours(-3), selector);
    assert!(matches!(result, Err(SelectionError::Config(_))));
}

#[test]
fn test_selector_receives_engine_time() {
    let mut engine = create_test_engine();
    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    let selector = move |now: DateTime<Utc>| -> anyhow::Result<Vec<InstrumentId>> {
        assert_eq!(now, t0());
        seen.set(seen.get() + 1);
        Ok(Vec::new())
    };
    let mut model = ChainUniverseSelectionModel::new(Duration::zero(), selector).unwrap();

    let universes = model.create_universes(&mut engine.context()).unwrap();
    assert!(universes.is_empty());
    assert_eq!(calls.get(), 1);
    assert_eq!(model.next_refresh_time_utc(), t0());
}

#[test]
fn test_engine_defaults_apply_without_model_settings() {
    let defaults = UniverseSettings { resolution: Resolution::Second, ..Default::default() };
    let mut engine = SimulatedEngine::new(t0(), defaults.clone());
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![InstrumentId::future("CL", "NYMEX")]),
    )
    .unwrap();

    let universes = model.create_universes(&mut engine.context()).unwrap();
    assert_eq!(universes[0].settings, defaults);
    assert_eq!(universes[0].security.config().resolution, Resolution::Second);
}

#[test]
fn test_model_settings_override_engine_defaults() {
    let mut engine = create_test_engine();
    let settings = UniverseSettings {
        resolution: Resolution::Daily,
        leverage: 2.0,
        ..Default::default()
    };
    let mut model = ChainUniverseSelectionModel::new(
        Duration::days(1),
        StaticSelector::new(vec![InstrumentId::future("GC", "COMEX")]),
    )
    .unwrap()
    .with_universe_settings(settings.clone());

    let universes = model.create_universes(&mut engine.context()).unwrap();
    assert_eq!(universes[0].settings, settings);
    assert_eq!(universes[0].security.leverage(), 2.0);
    assert_eq!(universes[0].security.config().resolution, Resolution::Daily);
}

#[test]
fn test_filter_is_attached_to_new_and_existing_securities() {
    let mut engine = create_test_engine();
    let es = InstrumentId::future("ES", "CME");

    let mut identity =
        ChainUniverseSelectionModel::new(Duration::days(1), StaticSelector::new(vec![es.clone()]))
            .unwrap();
    let before = identity.create_universes(&mut engine.context()).unwrap();
    let spec = ContractFilterSpec::default();
    assert_eq!(before[0].security.apply_filter(spec.clone()), spec);

    // A second model reuses the registered security and re-attaches its filter
    let mut front_month =
        ChainUniverseSelectionModel::new(Duration::days(1), StaticSelector::new(vec![es]))
            .unwrap()
            .with_filter(|spec: ContractFilterSpec| spec.front_month().expiration(0, 90));
    let after = front_month.create_universes(&mut engine.context()).unwrap();

    assert!(Arc::ptr_eq(&before[0].security, &after[0].security));
    let narrowed = before[0].security.apply_filter(ContractFilterSpec::default());
    assert!(narrowed.front_month_only);
    assert_eq!(narrowed.max_expiry_days, 90);
    assert_eq!(front_month.metrics().securities_reused, 1);
}

#[test]
fn test_simulated_engine_polls_on_schedule() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::hours(4),
        StaticSelector::new(vec![InstrumentId::future("ES", "CME")]),
    )
    .unwrap();

    let mut ran = Vec::new();
    for _ in 0..9 {
        ran.push(engine.poll(&mut model).unwrap());
        engine.advance(Duration::hours(1));
    }

    assert_eq!(ran, vec![true, false, false, false, true, false, false, false, true]);
    assert_eq!(engine.refreshes(), 3);
    assert_eq!(engine.active_universes().len(), 1);
    assert_eq!(engine.securities().creations(), 1);
    assert_eq!(model.metrics().securities_reused, 2);
}

#[test]
fn test_failed_poll_keeps_previous_universes() {
    let mut engine = create_test_engine();
    let flip = Rc::new(Cell::new(false));
    let fail = Rc::clone(&flip);
    let selector = move |_: DateTime<Utc>| -> anyhow::Result<Vec<InstrumentId>> {
        if fail.get() {
            anyhow::bail!("selector offline");
        }
        Ok(vec![InstrumentId::future("ES", "CME")])
    };
    let mut model = ChainUniverseSelectionModel::new(Duration::hours(1), selector).unwrap();

    assert!(engine.poll(&mut model).unwrap());
    flip.set(true);
    engine.advance(Duration::hours(1));

    assert!(engine.poll(&mut model).is_err());
    assert_eq!(engine.active_universes().len(), 1);
    assert_eq!(engine.refreshes(), 1);

    // Next poll within the interval is not due, so no busy retry
    assert!(!engine.poll(&mut model).unwrap());
}

#[test]
fn test_model_is_usable_as_trait_object() {
    let mut engine = create_test_engine();
    let es = StaticSelector::new(vec![InstrumentId::future("ES", "CME")]);
    let zn = StaticSelector::new(vec![InstrumentId::future("ZN", "CBOT")]);
    let mut models: Vec<Box<dyn UniverseSelectionModel>> = vec![
        Box::new(ChainUniverseSelectionModel::new(Duration::days(1), es).unwrap()),
        Box::new(ChainUniverseSelectionModel::new(Duration::days(1), zn).unwrap()),
    ];

    for model in models.iter_mut() {
        assert!(engine.poll(model.as_mut()).unwrap());
    }
    assert_eq!(engine.securities().len(), 2);
}

#[test]
fn test_universe_changes_drive_rsi_alpha() {
    let mut engine = create_test_engine();
    let rotated = Rc::new(Cell::new(false));
    let rotation = Rc::clone(&rotated);
    let selector = move |_: DateTime<Utc>| -> anyhow::Result<Vec<InstrumentId>> {
        let second = if rotation.get() { "CL" } else { "NQ" };
        Ok(vec![InstrumentId::future("ES", "CME"), InstrumentId::future(second, "CME")])
    };
    let mut model = ChainUniverseSelectionModel::new(Duration::hours(1), selector).unwrap();
    let mut alpha = RsiAlphaModel::new(2, Resolution::Hour).unwrap();
    let mut history = InMemoryPriceHistory::new();

    let es = InstrumentId::canonical(AssetClass::Future, "ES", "CME");
    let nq = InstrumentId::canonical(AssetClass::Future, "NQ", "CME");
    let cl = InstrumentId::canonical(AssetClass::Future, "CL", "CME");

    assert!(engine.poll(&mut model).unwrap());
    assert_eq!(engine.last_changes().added, vec![es.clone(), nq.clone()]);
    assert!(engine.last_changes().removed.is_empty());
    alpha.on_securities_changed(engine.last_changes(), &mut history);

    let mut insights = Vec::new();
    for close in [100, 101, 102] {
        engine.advance(Duration::minutes(10));
        let bars: Vec<PriceBar> = engine
            .active_universes()
            .iter()
            .map(|u| PriceBar {
                symbol: u.symbol().clone(),
                time: engine.utc_time(),
                close: Decimal::from(close),
            })
            .collect();
        insights.extend(alpha.update(engine.utc_time(), &bars));
    }
    assert_eq!(insights.len(), 2);
    assert!(insights.iter().all(|i| i.direction == InsightDirection::Down));

    rotated.set(true);
    engine.advance(Duration::hours(1));
    assert!(engine.poll(&mut model).unwrap());
    assert_eq!(engine.last_changes().added, vec![cl.clone()]);
    assert_eq!(engine.last_changes().removed, vec![nq.clone()]);
    alpha.on_securities_changed(engine.last_changes(), &mut history);

    assert!(alpha.is_tracking(&es));
    assert!(alpha.is_tracking(&cl));
    assert!(!alpha.is_tracking(&nq));
}

#[test]
fn test_unchanged_refresh_reports_no_changes() {
    let mut engine = create_test_engine();
    let mut model = ChainUniverseSelectionModel::new(
        Duration::hours(1),
        StaticSelector::new(vec![InstrumentId::future("ES", "CME")]),
    )
    .unwrap();

    assert!(engine.poll(&mut model).unwrap());
    assert!(!engine.last_changes().is_empty());

    engine.advance(Duration::hours(1));
    assert!(engine.poll(&mut model).unwrap());
    assert!(engine.last_changes().is_empty());
}
