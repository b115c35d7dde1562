//! Core contracts for premia.
//!
//! This crate contains:
//! - Canonical domain models and validation
//! - The market-data provider contract
//! - The two-tier cache manager and durable-tier contract
//! - Configuration and logging bootstrap

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod provider;

pub use cache::{CacheManager, DurableCache, DurableCacheError, DEFAULT_FAST_CAPACITY};
pub use config::{AppConfig, CacheSettings, LogFormat, LogSettings, ScreeningSettings};
pub use domain::{
    OptionChain, OptionContract, OptionType, PriceBar, PriceSeries, Quote, Symbol, UtcDateTime,
};
pub use error::{CoreError, ValidationError};
pub use premia_store::{DurableStore, StoreConfig, StoreError};
pub use provider::{MarketDataProvider, ProviderError, ProviderErrorKind};
