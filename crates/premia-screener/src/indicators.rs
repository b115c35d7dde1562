//! Pure indicator functions over ordered price series.
//!
//! All functions are deterministic given the same series and fail with
//! `InsufficientData` rather than silently shortening their window.

use premia_core::{PriceBar, PriceSeries, Symbol, UtcDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

/// Short simple-moving-average window.
pub const SMA_SHORT_PERIOD: usize = 20;
/// Long simple-moving-average window.
pub const SMA_LONG_PERIOD: usize = 60;
/// RSI window (bar-to-bar deltas).
pub const RSI_PERIOD: usize = 14;
/// Average-volume window.
pub const VOLUME_PERIOD: usize = 20;

/// Mean closing price of the last `period` bars.
pub fn sma(series: &PriceSeries, period: usize) -> Result<f64, ScreenError> {
    sma_slice(series.bars(), period)
}

/// RSI over a rolling window of `period` bar-to-bar deltas.
///
/// RS = avg(gain)/avg(loss); RSI = 100 − 100/(1+RS). When the window holds
/// no losses the result is exactly 100.0, never NaN.
pub fn rsi(series: &PriceSeries, period: usize) -> Result<f64, ScreenError> {
    rsi_slice(series.bars(), period)
}

/// Mean volume of the last `period` bars.
pub fn volume_average(series: &PriceSeries, period: usize) -> Result<f64, ScreenError> {
    let bars = series.bars();
    let period = require_window(bars.len(), period)?;
    let window = &bars[bars.len() - period..];
    let total: u64 = window.iter().map(|bar| bar.volume).sum();
    Ok(total as f64 / period as f64)
}

pub(crate) fn sma_slice(bars: &[PriceBar], period: usize) -> Result<f64, ScreenError> {
    let period = require_window(bars.len(), period)?;
    let window = &bars[bars.len() - period..];
    let total: f64 = window.iter().map(|bar| bar.close).sum();
    Ok(total / period as f64)
}

pub(crate) fn rsi_slice(bars: &[PriceBar], period: usize) -> Result<f64, ScreenError> {
    if period == 0 || bars.len() < period + 1 {
        return Err(ScreenError::InsufficientData {
            required: period.max(1) + 1,
            actual: bars.len(),
        });
    }

    let window = &bars[bars.len() - (period + 1)..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1].close - pair[0].close;
        if delta >= 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

fn require_window(len: usize, period: usize) -> Result<usize, ScreenError> {
    if period == 0 || len < period {
        return Err(ScreenError::InsufficientData {
            required: period.max(1),
            actual: len,
        });
    }
    Ok(period)
}

/// Indicator snapshot for one symbol.
///
/// Each value is either finite or unavailable (insufficient history);
/// consumers must treat `None` as "do not use", never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub symbol: Symbol,
    pub as_of: UtcDateTime,
    pub sma_20: Option<f64>,
    pub sma_60: Option<f64>,
    pub rsi_14: Option<f64>,
    pub avg_volume_20: Option<f64>,
}

impl Indicators {
    /// Compute the standard snapshot, leaving short-history values absent.
    pub fn compute(series: &PriceSeries) -> Self {
        Self {
            symbol: series.symbol().clone(),
            as_of: series
                .last()
                .map(|bar| bar.ts)
                .unwrap_or_else(UtcDateTime::now),
            sma_20: sma(series, SMA_SHORT_PERIOD).ok(),
            sma_60: sma(series, SMA_LONG_PERIOD).ok(),
            rsi_14: rsi(series, RSI_PERIOD).ok(),
            avg_volume_20: volume_average(series, VOLUME_PERIOD).ok(),
        }
    }
}
