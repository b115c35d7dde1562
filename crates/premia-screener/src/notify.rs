//! Notification seam for matched symbols.
//!
//! Formatting and delivery (email, webhooks) live outside this workspace;
//! the screener only hands completed results to a [`MatchNotifier`].

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::screener::ScreeningResult;

/// Consumer of matched screening results.
pub trait MatchNotifier: Send + Sync {
    fn notify<'a>(
        &'a self,
        result: &'a ScreeningResult,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Default sink: structured log lines, one per match.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl MatchNotifier for LogNotifier {
    fn notify<'a>(
        &'a self,
        result: &'a ScreeningResult,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            info!(
                symbol = %result.symbol,
                signal_strength = result.signal_strength,
                strike = result.option.as_ref().map(|option| option.strike),
                premium_yield = result.option.as_ref().map(|option| option.premium_yield),
                "match_notification"
            );
        })
    }
}

/// Deliver every matched result to the notifier, in order.
pub async fn notify_matches(notifier: &dyn MatchNotifier, results: &[ScreeningResult]) {
    for result in results.iter().filter(|result| result.matches) {
        notifier.notify(result).await;
    }
}
