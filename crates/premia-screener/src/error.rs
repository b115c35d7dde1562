use premia_core::{ProviderError, ValidationError};
use thiserror::Error;

/// Errors raised by the screening pipeline.
///
/// Every variant is isolated per symbol by the orchestrator: a failing
/// symbol becomes a `Failed` outcome and never aborts its batch.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A numeric function was asked for more history than the series holds.
    #[error("insufficient data: need {required} bars, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// A strategy named a condition kind this engine does not know.
    #[error("unknown condition kind '{kind}'")]
    UnknownCondition { kind: String },

    /// A condition carried a rule expression that does not parse.
    #[error("invalid rule expression '{rule}'")]
    InvalidRule { rule: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
