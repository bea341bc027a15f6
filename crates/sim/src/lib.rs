//! Plant model, disturbance generators and the closed-loop driver.

mod config;
mod driver;
mod error;
mod plant;
pub mod signals;
mod smoothing;

pub use config::{FallbackPolicy, SimConfig};
pub use controller::{Actuators, SensorReadings};
pub use driver::{Actuator, Quantity, Simulation, Step, Trace};
pub use error::SimError;
pub use plant::{DryingLaw, PlantParams, PlantState, TemperatureLaw};
pub use signals::{Disturbances, Signal, SignalParams};
pub use smoothing::MovingAverage;
