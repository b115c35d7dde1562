mod models;
mod options;
mod symbol;
mod timestamp;

pub use models::{PriceBar, PriceSeries, Quote};
pub use options::{OptionChain, OptionContract, OptionType};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
