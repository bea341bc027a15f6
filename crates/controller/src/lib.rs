//! Mamdani fuzzy inference and the climate controller configurations.

mod engine;
mod error;
mod membership;
pub mod presets;
mod rule;
mod variable;

pub use engine::{centroid, FuzzyController};
pub use error::{ConfigError, InferenceError};
pub use membership::Triangular;
pub use presets::{Actuators, ClimateControllers, Decisions, SensorReadings};
pub use rule::{Clause, Rule, RuleBuilder};
pub use variable::{FuzzySet, LinguisticVariable};
