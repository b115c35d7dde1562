//! Behavior of the rule-evaluation engine: conjunctive matching, weighted
//! signal strength, and strategy-defect errors.

use std::str::FromStr;
use std::sync::Arc;

use premia_core::Symbol;
use premia_screener::{
    Condition, ConditionKind, EvalContext, Indicators, RuleEvaluator, ScreenError, Strategy,
};
use premia_tests::{daily_series, quote_for, rising_closes};

fn context_for<'a>(
    symbol: &'a Symbol,
    quote: &'a premia_core::Quote,
    series: &'a premia_core::PriceSeries,
    indicators: &'a Indicators,
) -> EvalContext<'a> {
    EvalContext {
        symbol,
        quote,
        series,
        indicators,
    }
}

#[test]
fn two_of_three_equally_weighted_conditions_do_not_match() {
    // Given: a 70-bar uptrend, so both trend conditions hold but the
    // oversold condition cannot
    let symbol = Symbol::parse("AAPL").expect("symbol");
    let series = daily_series(&symbol, &rising_closes(70));
    let indicators = Indicators::compute(&series);
    let quote = quote_for(&symbol, 170.0);
    let ctx = context_for(&symbol, &quote, &series, &indicators);

    let strategy = Strategy::new(
        "put-income",
        "1",
        vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 1.0).expect("condition"),
            Condition::new(ConditionKind::Trend, "price > sma_20", 1.0).expect("condition"),
            Condition::new(ConditionKind::Oversold, "", 1.0).expect("condition"),
        ],
    );

    // When: the strategy is evaluated
    let outcome = RuleEvaluator::new(Arc::new(strategy))
        .evaluate(&ctx)
        .expect("evaluate");

    // Then: no match, two conditions met, strength ≈ 2/3
    assert!(!outcome.matches);
    assert_eq!(outcome.conditions_met.len(), 2);
    assert!((outcome.signal_strength - 0.667).abs() < 1e-3);
}

#[test]
fn signal_strength_is_reported_even_on_non_matches() {
    let symbol = Symbol::parse("AAPL").expect("symbol");
    let series = daily_series(&symbol, &rising_closes(70));
    let indicators = Indicators::compute(&series);
    let quote = quote_for(&symbol, 170.0);
    let ctx = context_for(&symbol, &quote, &series, &indicators);

    // Weighted 4:1 towards the satisfied trend condition.
    let strategy = Strategy::new(
        "put-income",
        "1",
        vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 4.0).expect("condition"),
            Condition::new(ConditionKind::Oversold, "", 1.0).expect("condition"),
        ],
    );

    let outcome = RuleEvaluator::new(Arc::new(strategy))
        .evaluate(&ctx)
        .expect("evaluate");

    assert!(!outcome.matches, "weights never relax the conjunction");
    assert!((outcome.signal_strength - 0.8).abs() < 1e-6);
    assert_eq!(outcome.conditions_missed, vec![ConditionKind::Oversold]);
}

#[test]
fn a_full_sweep_matches_with_unit_strength() {
    let symbol = Symbol::parse("AAPL").expect("symbol");
    let series = daily_series(&symbol, &rising_closes(70));
    let indicators = Indicators::compute(&series);
    let quote = quote_for(&symbol, 170.0);
    let ctx = context_for(&symbol, &quote, &series, &indicators);

    let strategy = Strategy::new(
        "put-income",
        "1",
        vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 2.0).expect("condition"),
            Condition::new(ConditionKind::Trend, "price >= sma_20", 3.0).expect("condition"),
        ],
    );

    let outcome = RuleEvaluator::new(Arc::new(strategy))
        .evaluate(&ctx)
        .expect("evaluate");

    assert!(outcome.matches);
    assert_eq!(outcome.signal_strength, 1.0);
}

#[test]
fn an_unknown_condition_kind_is_a_strategy_defect() {
    let error = ConditionKind::from_str("lunar_phase").expect_err("must fail");
    assert!(matches!(error, ScreenError::UnknownCondition { kind } if kind == "lunar_phase"));
}

#[test]
fn condition_order_is_preserved_in_the_outcome() {
    let symbol = Symbol::parse("AAPL").expect("symbol");
    let series = daily_series(&symbol, &rising_closes(70));
    let indicators = Indicators::compute(&series);
    let quote = quote_for(&symbol, 170.0);
    let ctx = context_for(&symbol, &quote, &series, &indicators);

    let strategy = Strategy::new(
        "put-income",
        "1",
        vec![
            Condition::new(ConditionKind::Trend, "price > sma_20", 1.0).expect("condition"),
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 1.0).expect("condition"),
        ],
    );

    let outcome = RuleEvaluator::new(Arc::new(strategy))
        .evaluate(&ctx)
        .expect("evaluate");

    assert_eq!(
        outcome.conditions_met,
        vec![ConditionKind::Trend, ConditionKind::Trend],
        "conditions are evaluated and reported in strategy order"
    );
}
