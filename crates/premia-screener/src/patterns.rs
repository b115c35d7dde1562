//! Boolean pattern recognizers over ordered price series.
//!
//! Unlike the indicator functions, a too-short series is simply "no
//! pattern": these return false rather than erroring.

use premia_core::PriceSeries;

/// Default bounce-pattern lookback.
pub const BOUNCE_LOOKBACK: usize = 5;
/// Default volume-spike multiple.
pub const VOLUME_SPIKE_THRESHOLD: f64 = 1.2;
/// Baseline window for volume-spike confirmation, excluding the latest bar.
pub const VOLUME_BASELINE_PERIOD: usize = 20;

/// Recovery off a recent swing low.
///
/// Within the last `lookback` bars, find the bar with the minimum low. The
/// pattern holds iff that bar is not the most recent one, some later bar
/// printed a high strictly above the pivot's high, and the latest bar's low
/// is strictly above the pivot's low. Needs `lookback + 2` bars of history.
pub fn higher_high_higher_low(series: &PriceSeries, lookback: usize) -> bool {
    let bars = series.bars();
    if lookback == 0 || bars.len() < lookback + 2 {
        return false;
    }

    let window = &bars[bars.len() - lookback..];
    let mut pivot_index = 0;
    for (index, bar) in window.iter().enumerate() {
        if bar.low < window[pivot_index].low {
            pivot_index = index;
        }
    }

    // The low is the latest bar: no recovery has happened yet.
    if pivot_index == window.len() - 1 {
        return false;
    }

    let pivot = &window[pivot_index];
    let recovered = window[pivot_index + 1..]
        .iter()
        .any(|bar| bar.high > pivot.high);
    let holding = window[window.len() - 1].low > pivot.low;

    recovered && holding
}

/// Volume spike versus the trailing baseline.
///
/// True iff the latest bar's volume is at least `threshold` times the mean
/// volume of the preceding [`VOLUME_BASELINE_PERIOD`] bars (the latest bar
/// excluded). Needs `VOLUME_BASELINE_PERIOD + 1` bars of history.
pub fn volume_increase(series: &PriceSeries, threshold: f64) -> bool {
    let bars = series.bars();
    if bars.len() < VOLUME_BASELINE_PERIOD + 1 {
        return false;
    }

    let current = bars[bars.len() - 1].volume as f64;
    let baseline = &bars[bars.len() - 1 - VOLUME_BASELINE_PERIOD..bars.len() - 1];
    let mean = baseline.iter().map(|bar| bar.volume as f64).sum::<f64>()
        / VOLUME_BASELINE_PERIOD as f64;

    current >= threshold * mean
}
