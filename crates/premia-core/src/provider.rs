//! Market-data provider contract.
//!
//! Concrete API clients live outside this workspace; the screener only
//! depends on this trait. Retry and rate-limit policy are the provider's
//! concern, and any returned error becomes a single-symbol failure.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Date;

use crate::{OptionChain, PriceSeries, Quote, Symbol, UtcDateTime};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Unavailable,
    RateLimited,
    Timeout,
    NotFound,
    InvalidRequest,
    Internal,
}

/// Structured provider error surfaced to the screening pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: format!("no data available for symbol '{symbol}'"),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::Timeout => "provider.timeout",
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Market-data capability used by the screening pipeline.
///
/// Implementations must be `Send + Sync`; every method suspends at the
/// network boundary.
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the current quote for a symbol.
    fn get_quote<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, ProviderError>> + Send + 'a>>;

    /// Fetch daily bars for `[start, end]`, oldest first.
    fn get_historical_prices<'a>(
        &'a self,
        symbol: &'a Symbol,
        start: UtcDateTime,
        end: UtcDateTime,
    ) -> Pin<Box<dyn Future<Output = Result<PriceSeries, ProviderError>> + Send + 'a>>;

    /// Fetch the option chain for an expiration; `None` selects the
    /// provider's nearest listed expiration.
    fn get_option_chain<'a>(
        &'a self,
        symbol: &'a Symbol,
        expiration: Option<Date>,
    ) -> Pin<Box<dyn Future<Output = Result<OptionChain, ProviderError>> + Send + 'a>>;

    /// List available option expirations, soonest first.
    fn get_available_expirations<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Date>, ProviderError>> + Send + 'a>>;
}
