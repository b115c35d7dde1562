//! Strategy model: weighted conditions plus option-selection thresholds.
//!
//! Parsing strategy files is a collaborator concern; everything here is a
//! plain serde-deserializable model with constructor validation for
//! programmatic use.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use premia_core::ValidationError;
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

/// Closed set of condition kinds the evaluator knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionKind {
    Trend,
    Oversold,
    Bounce,
}

impl ConditionKind {
    pub const ALL: [Self; 3] = [Self::Trend, Self::Oversold, Self::Bounce];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trend => "trend",
            Self::Oversold => "oversold",
            Self::Bounce => "bounce",
        }
    }
}

impl Display for ConditionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionKind {
    type Err = ScreenError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trend" => Ok(Self::Trend),
            "oversold" => Ok(Self::Oversold),
            "bounce" => Ok(Self::Bounce),
            other => Err(ScreenError::UnknownCondition {
                kind: other.to_owned(),
            }),
        }
    }
}

/// Free-form per-condition parameters.
pub type ConditionParams = BTreeMap<String, serde_json::Value>;

/// One weighted screening condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    /// Rule expression interpreted only by this kind's handler.
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub params: ConditionParams,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Condition {
    pub fn new(
        kind: ConditionKind,
        rule: impl Into<String>,
        weight: f64,
    ) -> Result<Self, ValidationError> {
        if !weight.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "weight" });
        }
        if weight < 0.0 {
            return Err(ValidationError::NegativeValue { field: "weight" });
        }

        Ok(Self {
            kind,
            rule: rule.into(),
            params: ConditionParams::new(),
            weight,
        })
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub(crate) fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(serde_json::Value::as_f64)
    }

    pub(crate) fn param_usize(&self, key: &str) -> Option<usize> {
        self.params
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .map(|value| value as usize)
    }

    pub(crate) fn param_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(serde_json::Value::as_bool)
    }
}

/// Option-selection thresholds applied after a symbol matches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionThresholds {
    /// Minimum annualized premium yield.
    pub min_premium_yield: f64,
    pub min_volume: u64,
    pub min_open_interest: u64,
    /// Strike window around the underlying, as a fraction of its price.
    pub strike_tolerance: f64,
}

impl Default for OptionThresholds {
    fn default() -> Self {
        Self {
            min_premium_yield: 0.10,
            min_volume: 100,
            min_open_interest: 500,
            strike_tolerance: 0.05,
        }
    }
}

/// A named, versioned screening strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub options: OptionThresholds,
}

impl Strategy {
    pub fn new(name: impl Into<String>, version: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            conditions,
            options: OptionThresholds::default(),
        }
    }

    pub fn with_options(mut self, options: OptionThresholds) -> Self {
        self.options = options;
        self
    }

    /// Sum of all condition weights.
    pub fn total_weight(&self) -> f64 {
        self.conditions.iter().map(|condition| condition.weight).sum()
    }
}
