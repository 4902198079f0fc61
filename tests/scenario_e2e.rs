//! End-to-end search tests on concrete engagements
//!
//! Fixture scenarios under `tests/scenarios/` are picked up automatically by
//! the `dir-test` macro: add a `.json` file with an `expect` block and it
//! becomes a test.

use dir_test::{dir_test, Fixture};
use similar_asserts::assert_eq;
use skirmish_search::{
    core::{ActionKind, Allegiance, Combatant, Position, UnitId},
    scenario::Scenario,
    search::{
        compute_state_hash, DamageDifference, DamageInflicted, Evaluator, Order, SearchConfig,
        SearchEngine, SearchState, ValueFunction,
    },
    Result,
};

/// Friendly: range 5, damage 10, cooldown 1.0, speed 2.
/// Hostile: range 1, damage 20, cooldown 1.5, speed 3.
fn standoff(distance: f64) -> SearchState {
    let mut state = SearchState::new(0.0);
    state.add_combatant(
        Combatant::new(UnitId::new(0), Allegiance::Friendly, Position::new(0.0, 0.0), 100.0)
            .with_weapon(10.0, 5.0, 1.0)
            .with_speed(2.0),
    );
    state.add_combatant(
        Combatant::new(UnitId::new(0), Allegiance::Hostile, Position::new(distance, 0.0), 100.0)
            .with_weapon(20.0, 1.0, 1.5)
            .with_speed(3.0),
    );
    state
}

fn mirrored_duel() -> SearchState {
    let mut state = SearchState::new(0.0);
    for (allegiance, x) in [(Allegiance::Friendly, 0.0), (Allegiance::Hostile, 3.0)] {
        state.add_combatant(
            Combatant::new(UnitId::new(0), allegiance, Position::new(x, 0.0), 50.0)
                .with_weapon(10.0, 5.0, 1.0)
                .with_speed(2.0),
        );
    }
    state
}

fn engine(config: SearchConfig) -> SearchEngine {
    SearchEngine::new(config).expect("valid config")
}

#[test]
fn test_advances_when_out_of_range() -> Result<()> {
    let config = SearchConfig::default().with_depth(6).with_time_budget_ms(100);
    let outcome = engine(config).search(&standoff(10.0))?;

    assert_eq!(outcome.best_move.actions()[0].kind(), ActionKind::Move);
    assert!(matches!(outcome.orders()[0].order, Order::MoveTo { .. }));
    Ok(())
}

#[test]
fn test_attacks_once_in_range() -> Result<()> {
    let config = SearchConfig::default().with_depth(6).with_time_budget_ms(100);
    let outcome = engine(config).search(&standoff(4.0))?;

    assert_eq!(outcome.best_move.actions()[0].kind(), ActionKind::Attack);
    assert!(matches!(outcome.orders()[0].order, Order::Attack { .. }));
    Ok(())
}

#[test]
fn test_mirrored_duel_value_conventions() -> Result<()> {
    let state = mirrored_duel();
    let config = SearchConfig::default()
        .with_depth(2)
        .with_time_budget_ms(10_000)
        .with_value_function(ValueFunction::DamageDifference);
    let outcome = engine(config).search(&state)?;
    let leaf = outcome.principal_state.expect("principal leaf");

    // Two-sided: equal and opposite from the two perspectives
    let f = DamageDifference.evaluate(&leaf, Allegiance::Friendly);
    let h = DamageDifference.evaluate(&leaf, Allegiance::Hostile);
    assert_eq!(f, -h);

    // One-sided: both perspectives score the same exchange as a gain
    let f = DamageInflicted.evaluate(&leaf, Allegiance::Friendly);
    let h = DamageInflicted.evaluate(&leaf, Allegiance::Hostile);
    assert!(f >= 0.0 && h >= 0.0);
    assert_eq!(f, 10.0);
    assert_eq!(h, 10.0);
    Ok(())
}

#[test]
fn test_mirrored_duel_is_symmetric_under_flip() -> Result<()> {
    let state = mirrored_duel();
    let config = SearchConfig::default()
        .with_depth(4)
        .with_time_budget_ms(10_000)
        .with_value_function(ValueFunction::DamageDifference);
    let engine = engine(config);

    let as_friendly = engine.search(&state)?;
    let as_hostile = engine.search(&state.flipped())?;
    assert_eq!(as_friendly.score, as_hostile.score);
    assert_eq!(
        as_friendly.best_move.actions()[0].kind(),
        as_hostile.best_move.actions()[0].kind()
    );
    Ok(())
}

#[test]
fn test_same_input_same_decision() -> Result<()> {
    let scenario = skirmish_search::scenario::random_scenario(11, 2);
    let root = scenario.root_state()?;
    let hash = compute_state_hash(&root);
    let config = SearchConfig::default().with_depth(3).with_time_budget_ms(60_000);

    let first = engine(config.clone()).search(&root)?;
    let second = engine(config).search(&root)?;

    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.score, second.score);
    assert_eq!(first.stats.nodes_searched, second.stats.nodes_searched);
    assert_eq!(compute_state_hash(&root), hash);
    Ok(())
}

#[dir_test(
    dir: "$CARGO_MANIFEST_DIR/tests/scenarios",
    glob: "**/*.json",
)]
fn test_scenario_fixture(fixture: Fixture<&str>) {
    let scenario = Scenario::from_json(fixture.content())
        .unwrap_or_else(|e| panic!("{}: {e}", fixture.path()));
    let root = scenario.root_state().expect("root state");
    let outcome = engine(scenario.config.clone()).search(&root).expect("search");

    assert!(!outcome.best_move.is_empty(), "{}: empty move", fixture.path());
    assert_eq!(outcome.orders().len(), outcome.best_move.len());

    let Some(expect) = scenario.expect else {
        return;
    };
    if let Some(kind) = expect.root_action {
        assert_eq!(
            outcome.best_move.actions()[0].kind(),
            kind,
            "{}: unexpected root action",
            fixture.path()
        );
    }
    if let Some(score) = expect.score {
        assert_eq!(outcome.score, score, "{}: unexpected score", fixture.path());
    }
}
