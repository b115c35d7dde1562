//! Screening pipeline for premia.
//!
//! This crate contains:
//! - Pure indicator and pattern functions over price series
//! - The strategy model and rule-evaluation engine
//! - Option selection and premium-yield scoring
//! - The concurrent screening orchestrator and notification seam

pub mod error;
pub mod indicators;
pub mod notify;
pub mod options;
pub mod patterns;
pub mod rules;
pub mod screener;
pub mod strategy;

pub use error::ScreenError;
pub use indicators::{rsi, sma, volume_average, Indicators};
pub use notify::{notify_matches, LogNotifier, MatchNotifier};
pub use options::{
    filter_by_liquidity, find_atm_puts, find_best_opportunity, premium_yield,
    OptionRecommendation,
};
pub use patterns::{higher_high_higher_low, volume_increase};
pub use rules::{EvalContext, RuleEvaluator, RuleOutcome};
pub use screener::{ScreeningResult, ScreeningStats, StockScreener, SymbolState};
pub use strategy::{Condition, ConditionKind, ConditionParams, OptionThresholds, Strategy};
