//! Simulation engine — per-run broker state and the bar-by-bar loop.
//!
//! Five phases per bar:
//! 1. Stop check: a long whose stop was touched is closed (gap-through fills at the open)
//! 2. Strategy: the bar is fed to the strategy, producing a signal
//! 3. Entry: a flat context sizes and opens a long on `EnterLong`
//! 4. Exit: a long is closed at the bar close on `ExitLong`
//! 5. Post-bar: trailing-stop ratchet, mark-to-market, equity point

pub mod context;
pub mod loop_runner;

pub use context::{PositionState, SimulationContext};
pub use loop_runner::{simulate, SimulationOutput};
