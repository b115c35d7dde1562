//! Screening orchestrator: per-symbol pipeline and bounded batch fan-out.
//!
//! Each symbol runs fetch → indicators → rule evaluation → option selection
//! while holding one semaphore permit. Batches spawn one task per symbol
//! into a `JoinSet` and drain completions as they land; a failing symbol is
//! logged and counted, never allowed to abort its siblings. Dropping the
//! batch future aborts all in-flight tasks and releases their permits.

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use premia_core::{
    CacheManager, CacheSettings, MarketDataProvider, OptionChain, PriceSeries, Quote,
    ScreeningSettings, Symbol, UtcDateTime,
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ScreenError;
use crate::indicators::Indicators;
use crate::options::{find_best_opportunity, OptionRecommendation};
use crate::rules::{EvalContext, RuleEvaluator};
use crate::strategy::{ConditionKind, Strategy};

/// Calendar days of daily bars fetched for indicator history.
const HISTORICAL_LOOKBACK_DAYS: u64 = 365;

/// Terminal and intermediate states of the per-symbol pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolState {
    Pending,
    Fetching,
    Evaluating,
    Matched,
    NoMatch,
    Failed,
}

impl SymbolState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Evaluating => "evaluating",
            Self::Matched => "matched",
            Self::NoMatch => "no_match",
            Self::Failed => "failed",
        }
    }
}

impl Display for SymbolState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable outcome of screening one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningResult {
    pub symbol: Symbol,
    pub timestamp: UtcDateTime,
    pub state: SymbolState,
    pub matches: bool,
    pub signal_strength: f64,
    pub conditions_met: Vec<ConditionKind>,
    pub conditions_missed: Vec<ConditionKind>,
    pub quote: Quote,
    pub indicators: Indicators,
    pub option: Option<OptionRecommendation>,
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningStats {
    pub total_symbols: usize,
    pub successful: usize,
    pub failed: usize,
    pub matches: usize,
    pub started_at: UtcDateTime,
    pub duration_seconds: f64,
}

/// Orchestrates the full screening pipeline across a symbol universe.
#[derive(Clone)]
pub struct StockScreener {
    provider: Arc<dyn MarketDataProvider>,
    strategy: Arc<Strategy>,
    evaluator: RuleEvaluator,
    cache: CacheManager,
    cache_settings: CacheSettings,
    permits: Arc<Semaphore>,
}

impl StockScreener {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        strategy: Strategy,
        cache: CacheManager,
        cache_settings: CacheSettings,
        screening: ScreeningSettings,
    ) -> Self {
        let strategy = Arc::new(strategy);
        Self {
            evaluator: RuleEvaluator::new(Arc::clone(&strategy)),
            strategy,
            provider,
            cache,
            cache_settings,
            permits: Arc::new(Semaphore::new(screening.max_concurrent.max(1))),
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Run the full pipeline for one symbol while holding a permit.
    pub async fn screen_symbol(&self, symbol: &Symbol) -> Result<ScreeningResult, ScreenError> {
        debug!(symbol = %symbol, state = %SymbolState::Pending, "symbol_state");
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .expect("screening semaphore is never closed");

        debug!(symbol = %symbol, state = %SymbolState::Fetching, "symbol_state");
        let quote = self.fetch_quote(symbol).await?;
        let series = self.fetch_historical(symbol).await?;

        debug!(symbol = %symbol, state = %SymbolState::Evaluating, "symbol_state");
        let indicators = Indicators::compute(&series);
        let ctx = EvalContext {
            symbol,
            quote: &quote,
            series: &series,
            indicators: &indicators,
        };
        let outcome = self.evaluator.evaluate(&ctx)?;

        let option = if outcome.matches {
            let chain = self.fetch_chain(symbol).await?;
            find_best_opportunity(&chain, &self.strategy.options, UtcDateTime::now())
        } else {
            None
        };

        let state = if outcome.matches {
            SymbolState::Matched
        } else {
            SymbolState::NoMatch
        };
        info!(
            symbol = %symbol,
            state = %state,
            signal_strength = outcome.signal_strength,
            has_option = option.is_some(),
            "symbol_screened"
        );

        Ok(ScreeningResult {
            symbol: symbol.clone(),
            timestamp: UtcDateTime::now(),
            state,
            matches: outcome.matches,
            signal_strength: outcome.signal_strength,
            conditions_met: outcome.conditions_met,
            conditions_missed: outcome.conditions_missed,
            quote,
            indicators,
            option,
        })
    }

    /// Screen every symbol, yielding results in completion order.
    ///
    /// Per-symbol failures are logged, counted in the stats, and excluded
    /// from the results; the batch itself never fails.
    pub async fn screen_batch(
        &self,
        symbols: &[Symbol],
    ) -> (Vec<ScreeningResult>, ScreeningStats) {
        let started_at = UtcDateTime::now();
        let clock = Instant::now();
        info!(symbols = symbols.len(), strategy = %self.strategy.name, "screening_started");

        let mut tasks = JoinSet::new();
        for symbol in symbols {
            let screener = self.clone();
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let outcome = screener.screen_symbol(&symbol).await;
                (symbol, outcome)
            });
        }

        let mut results = Vec::new();
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(result))) => results.push(result),
                Ok((symbol, Err(err))) => {
                    warn!(symbol = %symbol, state = %SymbolState::Failed, error = %err, "symbol_screening_failed");
                    failed += 1;
                }
                Err(err) => {
                    warn!(error = %err, "screening_task_aborted");
                    failed += 1;
                }
            }
        }

        let matches = results.iter().filter(|result| result.matches).count();
        let stats = ScreeningStats {
            total_symbols: symbols.len(),
            successful: results.len(),
            failed,
            matches,
            started_at,
            duration_seconds: clock.elapsed().as_secs_f64(),
        };
        info!(
            total_symbols = stats.total_symbols,
            successful = stats.successful,
            failed = stats.failed,
            matches = stats.matches,
            duration_seconds = stats.duration_seconds,
            "screening_complete"
        );

        (results, stats)
    }

    /// Screen every symbol and keep only the matches.
    pub async fn screen_and_filter(
        &self,
        symbols: &[Symbol],
    ) -> (Vec<ScreeningResult>, ScreeningStats) {
        let (results, stats) = self.screen_batch(symbols).await;
        let matches = results.into_iter().filter(|result| result.matches).collect();
        (matches, stats)
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, ScreenError> {
        let key = format!("quote:{symbol}");
        let provider = Arc::clone(&self.provider);
        let symbol = symbol.clone();
        self.cache
            .get_or_fetch(&key, self.cache_settings.quote_ttl(), false, move || {
                async move { provider.get_quote(&symbol).await }
            })
            .await
            .map_err(ScreenError::from)
    }

    async fn fetch_historical(&self, symbol: &Symbol) -> Result<PriceSeries, ScreenError> {
        let key = format!("hist:{symbol}");
        let provider = Arc::clone(&self.provider);
        let symbol = symbol.clone();
        self.cache
            .get_or_fetch(&key, self.cache_settings.historical_ttl(), true, move || {
                async move {
                    let end = UtcDateTime::now();
                    let start = end - Duration::from_secs(86_400 * HISTORICAL_LOOKBACK_DAYS);
                    provider.get_historical_prices(&symbol, start, end).await
                }
            })
            .await
            .map_err(ScreenError::from)
    }

    async fn fetch_chain(&self, symbol: &Symbol) -> Result<OptionChain, ScreenError> {
        let key = format!("chain:{symbol}");
        let provider = Arc::clone(&self.provider);
        let symbol = symbol.clone();
        self.cache
            .get_or_fetch(
                &key,
                self.cache_settings.option_chain_ttl(),
                true,
                move || async move { provider.get_option_chain(&symbol, None).await },
            )
            .await
            .map_err(ScreenError::from)
    }
}
