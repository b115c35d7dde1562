//! Behavior of the option analyzer: ATM windows, yield math, liquidity
//! filtering, and best-opportunity selection.

use premia_core::{OptionChain, Symbol, UtcDateTime};
use premia_screener::{
    filter_by_liquidity, find_atm_puts, find_best_opportunity, premium_yield, OptionThresholds,
};
use premia_tests::{front_expiration, put_contract};

fn chain_with_puts(
    symbol: &Symbol,
    underlying: f64,
    puts: Vec<premia_core::OptionContract>,
) -> OptionChain {
    OptionChain::new(symbol.clone(), front_expiration(), underlying, Vec::new(), puts)
        .expect("chain")
}

#[test]
fn atm_puts_on_underlying_100_stay_within_95_and_105() {
    // Given: strikes spanning well past the 5% window
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let puts = [85.0, 92.0, 95.0, 99.0, 101.0, 105.0, 112.0]
        .iter()
        .map(|strike| put_contract(&symbol, *strike, 1.0, 1.2, 300, 900))
        .collect();
    let chain = chain_with_puts(&symbol, 100.0, puts);

    // When: the ATM window is computed with 5% tolerance
    let atm = find_atm_puts(&chain, 0.05);

    // Then: only strikes in [95, 105], nearest first
    let strikes: Vec<f64> = atm.iter().map(|contract| contract.strike).collect();
    assert_eq!(strikes, vec![99.0, 101.0, 95.0, 105.0]);
    assert!(strikes.iter().all(|strike| (95.0..=105.0).contains(strike)));
}

#[test]
fn premium_yield_matches_the_reference_value() {
    // Given: mid 2.0 on a 100 stock, expiring 30 days out
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let contract = put_contract(&symbol, 100.0, 2.0, 2.0, 300, 900);

    // When/Then: (2/100) x (365/30) = 0.2433...
    let value = premium_yield(&contract, 100.0, UtcDateTime::now());
    assert!((value - 0.2433).abs() < 1e-3, "got {value}");
}

#[test]
fn liquidity_filter_is_an_and_not_an_or() {
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let contracts = vec![
        put_contract(&symbol, 100.0, 1.0, 1.2, 200, 600), // passes both
        put_contract(&symbol, 100.0, 1.0, 1.2, 200, 10),  // volume only
        put_contract(&symbol, 100.0, 1.0, 1.2, 10, 600),  // open interest only
        put_contract(&symbol, 100.0, 1.0, 1.2, 10, 10),   // neither
    ];

    let liquid = filter_by_liquidity(contracts, 100, 500);
    assert_eq!(liquid.len(), 1);
}

#[test]
fn best_opportunity_returns_none_when_the_chain_is_illiquid() {
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let puts = vec![put_contract(&symbol, 100.0, 2.0, 2.2, 5, 5)];
    let chain = chain_with_puts(&symbol, 100.0, puts);

    let selected = find_best_opportunity(&chain, &OptionThresholds::default(), UtcDateTime::now());
    assert!(selected.is_none());
}

#[test]
fn best_opportunity_returns_none_when_yield_is_below_the_bar() {
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let puts = vec![put_contract(&symbol, 100.0, 0.02, 0.04, 300, 900)];
    let chain = chain_with_puts(&symbol, 100.0, puts);

    let thresholds = OptionThresholds {
        min_premium_yield: 0.15,
        ..OptionThresholds::default()
    };
    let selected = find_best_opportunity(&chain, &thresholds, UtcDateTime::now());
    assert!(selected.is_none());
}

#[test]
fn best_opportunity_carries_the_contract_details() {
    let symbol = Symbol::parse("XYZ").expect("symbol");
    let puts = vec![
        put_contract(&symbol, 98.0, 2.9, 3.1, 300, 900),
        put_contract(&symbol, 102.0, 1.0, 1.2, 300, 900),
    ];
    let chain = chain_with_puts(&symbol, 100.0, puts);

    let thresholds = OptionThresholds {
        min_premium_yield: 0.05,
        min_volume: 100,
        min_open_interest: 500,
        strike_tolerance: 0.05,
    };
    let selected = find_best_opportunity(&chain, &thresholds, UtcDateTime::now())
        .expect("an opportunity must clear the bar");

    assert_eq!(selected.strike, 98.0, "the richer premium wins");
    assert!((selected.mid_price - 3.0).abs() < 1e-9);
    assert_eq!(selected.volume, 300);
    assert_eq!(selected.open_interest, 900);
    assert!(selected.premium_yield > 0.05);
}
