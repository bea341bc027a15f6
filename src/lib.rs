//! Fuzzy climate control simulation.
//!
//! Re-exports the controller, plant/driver and analysis crates so the
//! workspace scenarios can depend on one crate.

pub use analysis::*;
pub use controller::*;
pub use sim::*;
