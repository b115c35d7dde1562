//! Option-contract selection and premium-yield scoring.

use std::cmp::Ordering;

use premia_core::{OptionChain, OptionContract, OptionType, Symbol, UtcDateTime};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::strategy::OptionThresholds;

/// Days used to annualize premium yield.
const DAYS_PER_YEAR: f64 = 365.0;

/// Puts whose strike lies within `tolerance` of the underlying price,
/// ordered by ascending distance from the underlying. The sort is stable,
/// so equidistant strikes keep their chain order.
pub fn find_atm_puts(chain: &OptionChain, tolerance: f64) -> Vec<OptionContract> {
    let lower = chain.underlying_price * (1.0 - tolerance);
    let upper = chain.underlying_price * (1.0 + tolerance);

    let mut puts: Vec<OptionContract> = chain
        .puts
        .iter()
        .filter(|contract| contract.strike >= lower && contract.strike <= upper)
        .cloned()
        .collect();

    puts.sort_by(|a, b| {
        let da = (a.strike - chain.underlying_price).abs();
        let db = (b.strike - chain.underlying_price).abs();
        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
    });

    puts
}

/// Annualized mid-price premium yield against the stock price.
///
/// Returns 0.0 for expired or same-day contracts (days ≤ 0).
pub fn premium_yield(contract: &OptionContract, stock_price: f64, as_of: UtcDateTime) -> f64 {
    let days = as_of.days_until(contract.expiration);
    if days <= 0 || stock_price <= 0.0 {
        return 0.0;
    }

    (contract.mid() / stock_price) * (DAYS_PER_YEAR / days as f64)
}

/// Keep contracts meeting both liquidity floors.
pub fn filter_by_liquidity(
    contracts: Vec<OptionContract>,
    min_volume: u64,
    min_open_interest: u64,
) -> Vec<OptionContract> {
    contracts
        .into_iter()
        .filter(|contract| {
            contract.volume >= min_volume && contract.open_interest >= min_open_interest
        })
        .collect()
}

/// A concrete put-selling candidate surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecommendation {
    pub symbol: Symbol,
    pub strike: f64,
    pub expiration: Date,
    pub option_type: OptionType,
    pub bid: f64,
    pub ask: f64,
    pub mid_price: f64,
    /// Annualized premium yield at the mid price.
    pub premium_yield: f64,
    pub volume: u64,
    pub open_interest: u64,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
}

impl OptionRecommendation {
    fn from_contract(contract: &OptionContract, premium_yield: f64) -> Self {
        Self {
            symbol: contract.symbol.clone(),
            strike: contract.strike,
            expiration: contract.expiration,
            option_type: contract.option_type,
            bid: contract.bid,
            ask: contract.ask,
            mid_price: contract.mid(),
            premium_yield,
            volume: contract.volume,
            open_interest: contract.open_interest,
            implied_volatility: contract.implied_volatility,
            delta: contract.delta,
        }
    }
}

/// Best liquid ATM put clearing the minimum yield, or `None`.
///
/// Candidates are walked in moneyness order, and only a strictly greater
/// yield displaces the incumbent, so yield ties go to the nearest-ATM
/// contract.
pub fn find_best_opportunity(
    chain: &OptionChain,
    thresholds: &OptionThresholds,
    as_of: UtcDateTime,
) -> Option<OptionRecommendation> {
    let atm = find_atm_puts(chain, thresholds.strike_tolerance);
    let liquid = filter_by_liquidity(atm, thresholds.min_volume, thresholds.min_open_interest);

    let mut best: Option<(f64, OptionContract)> = None;
    for contract in liquid {
        let candidate_yield = premium_yield(&contract, chain.underlying_price, as_of);
        if candidate_yield < thresholds.min_premium_yield {
            continue;
        }

        match &best {
            Some((best_yield, _)) if candidate_yield <= *best_yield => {}
            _ => best = Some((candidate_yield, contract)),
        }
    }

    best.map(|(candidate_yield, contract)| {
        OptionRecommendation::from_contract(&contract, candidate_yield)
    })
}
