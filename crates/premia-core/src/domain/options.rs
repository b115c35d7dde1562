use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::domain::models::{validate_finite, validate_non_negative, validate_positive};
use crate::{Symbol, ValidationError};

/// Contract right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl Display for OptionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single listed option contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: Symbol,
    pub strike: f64,
    pub expiration: Date,
    pub option_type: OptionType,
    pub bid: f64,
    pub ask: f64,
    pub volume: u64,
    pub open_interest: u64,
    pub implied_volatility: Option<f64>,
    pub delta: Option<f64>,
}

impl OptionContract {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        strike: f64,
        expiration: Date,
        option_type: OptionType,
        bid: f64,
        ask: f64,
        volume: u64,
        open_interest: u64,
        implied_volatility: Option<f64>,
        delta: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_positive("strike", strike)?;
        validate_non_negative("bid", bid)?;
        validate_non_negative("ask", ask)?;
        if bid > ask {
            return Err(ValidationError::BidAboveAsk { bid, ask });
        }
        if let Some(value) = implied_volatility {
            validate_non_negative("implied_volatility", value)?;
        }
        if let Some(value) = delta {
            validate_finite("delta", value)?;
        }

        Ok(Self {
            symbol,
            strike,
            expiration,
            option_type,
            bid,
            ask,
            volume,
            open_interest,
            implied_volatility,
            delta,
        })
    }

    /// Midpoint of the bid/ask spread.
    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}

/// One expiration's listed calls and puts for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub symbol: Symbol,
    pub expiration: Date,
    pub underlying_price: f64,
    pub calls: Vec<OptionContract>,
    pub puts: Vec<OptionContract>,
}

impl OptionChain {
    pub fn new(
        symbol: Symbol,
        expiration: Date,
        underlying_price: f64,
        calls: Vec<OptionContract>,
        puts: Vec<OptionContract>,
    ) -> Result<Self, ValidationError> {
        validate_positive("underlying_price", underlying_price)?;

        Ok(Self {
            symbol,
            expiration,
            underlying_price,
            calls,
            puts,
        })
    }
}
