//! Domain types for stratsim

pub mod bar;
pub mod equity;
pub mod position;
pub mod trade;

pub use bar::{PriceBar, PriceSeries};
pub use equity::{equity_values, EquityPoint};
pub use position::Position;
pub use trade::{ExitReason, Trade};
