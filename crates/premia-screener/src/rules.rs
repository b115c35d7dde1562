//! Condition evaluation against computed indicators and patterns.
//!
//! A match requires every condition to hold; weights never relax that
//! conjunction. They only scale the reported signal strength, which is why
//! a non-matching symbol still carries a meaningful strength value.

use premia_core::{PriceSeries, Quote, Symbol};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ScreenError;
use crate::indicators::{rsi_slice, Indicators, RSI_PERIOD, SMA_LONG_PERIOD, SMA_SHORT_PERIOD};
use crate::patterns;
use crate::strategy::{Condition, ConditionKind, Strategy};

/// Everything a condition check may read for one symbol.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub symbol: &'a Symbol,
    pub quote: &'a Quote,
    pub series: &'a PriceSeries,
    pub indicators: &'a Indicators,
}

/// Result of evaluating a strategy against one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub matches: bool,
    pub conditions_met: Vec<ConditionKind>,
    pub conditions_missed: Vec<ConditionKind>,
    /// Weighted fraction of satisfied conditions, in [0, 1].
    pub signal_strength: f64,
}

const DEFAULT_OVERSOLD_THRESHOLD: f64 = 30.0;
const DEFAULT_OVERSOLD_LOOKBACK: usize = 5;

/// Stateless evaluator for a fixed strategy.
#[derive(Clone)]
pub struct RuleEvaluator {
    strategy: Arc<Strategy>,
}

impl RuleEvaluator {
    pub fn new(strategy: Arc<Strategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Evaluate every condition in order.
    ///
    /// # Errors
    /// `InsufficientData` when a condition references an unavailable
    /// indicator, `InvalidRule` for an unparsable rule expression.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Result<RuleOutcome, ScreenError> {
        let mut conditions_met = Vec::new();
        let mut conditions_missed = Vec::new();
        let mut met_weight = 0.0;
        let mut total_weight = 0.0;

        for condition in &self.strategy.conditions {
            let satisfied = check_condition(condition, ctx)?;
            total_weight += condition.weight;
            if satisfied {
                met_weight += condition.weight;
                conditions_met.push(condition.kind);
            } else {
                conditions_missed.push(condition.kind);
            }
        }

        let signal_strength = if total_weight > 0.0 {
            (met_weight / total_weight).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(RuleOutcome {
            matches: conditions_missed.is_empty(),
            conditions_met,
            conditions_missed,
            signal_strength,
        })
    }
}

fn check_condition(condition: &Condition, ctx: &EvalContext<'_>) -> Result<bool, ScreenError> {
    match condition.kind {
        ConditionKind::Trend => check_trend(condition, ctx),
        ConditionKind::Oversold => check_oversold(condition, ctx),
        ConditionKind::Bounce => Ok(check_bounce(condition, ctx)),
    }
}

/// Trend rules compare two operands, e.g. `sma_20 > sma_60` or
/// `price >= sma_20`.
fn check_trend(condition: &Condition, ctx: &EvalContext<'_>) -> Result<bool, ScreenError> {
    let mut tokens = condition.rule.split_whitespace();
    let (Some(lhs), Some(op), Some(rhs), None) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ScreenError::InvalidRule {
            rule: condition.rule.clone(),
        });
    };

    let lhs = resolve_operand(lhs, condition, ctx)?;
    let rhs = resolve_operand(rhs, condition, ctx)?;

    match op {
        ">" => Ok(lhs > rhs),
        ">=" => Ok(lhs >= rhs),
        "<" => Ok(lhs < rhs),
        "<=" => Ok(lhs <= rhs),
        _ => Err(ScreenError::InvalidRule {
            rule: condition.rule.clone(),
        }),
    }
}

fn resolve_operand(
    name: &str,
    condition: &Condition,
    ctx: &EvalContext<'_>,
) -> Result<f64, ScreenError> {
    match name {
        "price" => Ok(ctx.quote.price),
        "sma_20" => require_indicator(ctx.indicators.sma_20, SMA_SHORT_PERIOD, ctx),
        "sma_60" => require_indicator(ctx.indicators.sma_60, SMA_LONG_PERIOD, ctx),
        "rsi_14" => require_indicator(ctx.indicators.rsi_14, RSI_PERIOD + 1, ctx),
        literal => literal.parse::<f64>().map_err(|_| ScreenError::InvalidRule {
            rule: condition.rule.clone(),
        }),
    }
}

fn require_indicator(
    value: Option<f64>,
    required: usize,
    ctx: &EvalContext<'_>,
) -> Result<f64, ScreenError> {
    value.ok_or(ScreenError::InsufficientData {
        required,
        actual: ctx.series.len(),
    })
}

/// Oversold holds when the current RSI is below the threshold, or when any
/// RSI reading within the trailing lookback window dipped below it.
fn check_oversold(condition: &Condition, ctx: &EvalContext<'_>) -> Result<bool, ScreenError> {
    let threshold = condition
        .param_f64("threshold")
        .unwrap_or(DEFAULT_OVERSOLD_THRESHOLD);
    let lookback = condition
        .param_usize("lookback")
        .unwrap_or(DEFAULT_OVERSOLD_LOOKBACK);

    let current = require_indicator(ctx.indicators.rsi_14, RSI_PERIOD + 1, ctx)?;
    if current < threshold {
        return Ok(true);
    }

    let bars = ctx.series.bars();
    for offset in 1..=lookback {
        if bars.len() < offset + RSI_PERIOD + 1 {
            break;
        }
        let prior = rsi_slice(&bars[..bars.len() - offset], RSI_PERIOD)?;
        if prior < threshold {
            return Ok(true);
        }
    }

    Ok(false)
}

fn check_bounce(condition: &Condition, ctx: &EvalContext<'_>) -> bool {
    let lookback = condition
        .param_usize("lookback")
        .unwrap_or(patterns::BOUNCE_LOOKBACK);
    let confirm_volume = condition.param_bool("confirm_volume").unwrap_or(false);
    let volume_threshold = condition
        .param_f64("volume_threshold")
        .unwrap_or(patterns::VOLUME_SPIKE_THRESHOLD);

    let bounced = patterns::higher_high_higher_low(ctx.series, lookback);
    if !bounced {
        return false;
    }

    if confirm_volume {
        return patterns::volume_increase(ctx.series, volume_threshold);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use premia_core::{PriceBar, UtcDateTime};
    use std::time::Duration;

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let base = UtcDateTime::parse("2025-01-02T00:00:00Z").expect("timestamp");
        let bars = closes
            .iter()
            .enumerate()
            .map(|(index, close)| {
                let ts = base + Duration::from_secs(86_400 * index as u64);
                PriceBar::new(ts, *close, close + 1.0, close - 1.0, *close, 10_000).expect("bar")
            })
            .collect();
        PriceSeries::new(Symbol::parse("TEST").expect("symbol"), bars).expect("series")
    }

    fn quote_at(price: f64) -> Quote {
        Quote::new(
            Symbol::parse("TEST").expect("symbol"),
            price,
            0.0,
            None,
            None,
            UtcDateTime::parse("2025-04-01T16:00:00Z").expect("timestamp"),
        )
        .expect("quote")
    }

    fn evaluator(conditions: Vec<Condition>) -> RuleEvaluator {
        RuleEvaluator::new(Arc::new(Strategy::new("test", "1", conditions)))
    }

    #[test]
    fn two_of_three_equal_weights_is_not_a_match() {
        // 70 rising closes: sma_20 > sma_60 holds, price > sma_20 holds,
        // but a pure uptrend is never oversold.
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(200.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 1.0).expect("condition"),
            Condition::new(ConditionKind::Trend, "price > sma_20", 1.0).expect("condition"),
            Condition::new(ConditionKind::Oversold, "", 1.0).expect("condition"),
        ]);

        let outcome = evaluator.evaluate(&ctx).expect("evaluate");
        assert!(!outcome.matches, "weights must not relax the conjunction");
        assert_eq!(outcome.conditions_met.len(), 2);
        assert_eq!(outcome.conditions_missed, vec![ConditionKind::Oversold]);
        assert!((outcome.signal_strength - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn strength_is_weighted_not_counted() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(200.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 3.0).expect("condition"),
            Condition::new(ConditionKind::Oversold, "", 1.0).expect("condition"),
        ]);

        let outcome = evaluator.evaluate(&ctx).expect("evaluate");
        assert!(!outcome.matches);
        assert!((outcome.signal_strength - 0.75).abs() < 1e-6);
    }

    #[test]
    fn all_conditions_met_is_a_match() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(200.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 1.0).expect("condition"),
            Condition::new(ConditionKind::Trend, "price >= sma_20", 2.0).expect("condition"),
        ]);

        let outcome = evaluator.evaluate(&ctx).expect("evaluate");
        assert!(outcome.matches);
        assert_eq!(outcome.signal_strength, 1.0);
        assert!(outcome.conditions_missed.is_empty());
    }

    #[test]
    fn oversold_checks_the_trailing_window() {
        // A deep selloff followed by a sharp rebound: the current RSI is
        // elevated but a reading inside the lookback window was depressed.
        let mut closes: Vec<f64> = (0..30).map(|_| 100.0).collect();
        closes.extend((0..10).map(|i| 98.0 - 5.0 * i as f64)); // slide to 53
        closes.extend((0..4).map(|i| 70.0 + 9.0 * i as f64)); // rebound to 97
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(97.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let condition = Condition::new(ConditionKind::Oversold, "", 1.0)
            .expect("condition")
            .with_param("threshold", serde_json::json!(30.0))
            .with_param("lookback", serde_json::json!(5));
        let outcome = evaluator(vec![condition]).evaluate(&ctx).expect("evaluate");
        assert!(outcome.matches, "a recent dip below threshold still counts");
    }

    #[test]
    fn trend_rule_with_literal_operand() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(119.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "price > 110", 1.0).expect("condition"),
        ]);
        assert!(evaluator.evaluate(&ctx).expect("evaluate").matches);
    }

    #[test]
    fn malformed_rule_is_rejected() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(100.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "sma_20 crosses sma_60", 1.0).expect("condition"),
        ]);
        let err = evaluator.evaluate(&ctx).expect_err("must fail");
        assert!(matches!(err, ScreenError::InvalidRule { .. }));
    }

    #[test]
    fn unavailable_indicator_raises_insufficient_data() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let series = series_from_closes(&closes);
        let indicators = Indicators::compute(&series);
        let quote = quote_at(130.0);
        let ctx = EvalContext {
            symbol: series.symbol(),
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };

        let evaluator = evaluator(vec![
            Condition::new(ConditionKind::Trend, "sma_20 > sma_60", 1.0).expect("condition"),
        ]);
        let err = evaluator.evaluate(&ctx).expect_err("must fail");
        assert!(matches!(
            err,
            ScreenError::InsufficientData { required: 60, actual: 30 }
        ));
    }
}
