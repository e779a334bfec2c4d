//! Input data: the raw columnar frame and its validation into a series.

pub mod frame;
pub mod validate;

pub use frame::{PriceFrame, REQUIRED_COLUMNS};
pub use validate::{validate_bars, validate_frame, validate_frame_with_min_rows, MIN_ROWS};
