use std::path::Path;

use controller::Actuators;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::plant::PlantParams;
use crate::signals::SignalParams;

/// What to record when a controller reaches no consensus (no rule fired).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Keep the actuator's action from the previous step (0 at the first step).
    #[default]
    HoldPrevious,
    /// Switch the actuator to 0.
    Zero,
}

/// Run parameters. Built once, then handed to the driver by reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub duration_hours: f64,
    pub resolution_minutes: f64,
    pub seed: u64,
    /// Controllers are re-evaluated every `update_interval` steps; in between
    /// the previous actions are held.
    pub update_interval: usize,
    pub smoothing_window: usize,
    pub fallback: FallbackPolicy,
    /// Actuators forced to a fixed intensity for the whole run.
    pub pinned: Actuators<Option<f64>>,
    pub plant: PlantParams,
    pub signals: SignalParams,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_hours: 24.0,
            resolution_minutes: 2.0,
            seed: 12345,
            update_interval: 1,
            smoothing_window: 5,
            fallback: FallbackPolicy::default(),
            pinned: Actuators::default(),
            plant: PlantParams::default(),
            signals: SignalParams::default(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, SimError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let bad = |msg: String| Err(SimError::InvalidConfig(msg));

        if !(self.duration_hours > 0.0) || !self.duration_hours.is_finite() {
            return bad(format!(
                "duration_hours must be positive, got {}",
                self.duration_hours
            ));
        }
        if !(self.resolution_minutes > 0.0) || !self.resolution_minutes.is_finite() {
            return bad(format!(
                "resolution_minutes must be positive, got {}",
                self.resolution_minutes
            ));
        }
        if self.update_interval == 0 {
            return bad("update_interval must be at least 1".into());
        }
        if self.smoothing_window == 0 {
            return bad("smoothing_window must be at least 1".into());
        }

        let pins = [
            ("dehumidifier", self.pinned.dehumidifier),
            ("ventilation", self.pinned.ventilation),
            ("heating", self.pinned.heating),
        ];
        for (name, pin) in pins {
            if let Some(v) = pin {
                if !(-10.0..=10.0).contains(&v) {
                    return bad(format!("pinned {name} action must be within [-10, 10], got {v}"));
                }
            }
        }

        let probabilities = [
            ("signals.rain.probability", self.signals.rain.probability),
            ("signals.humidity.spike_chance", self.signals.humidity.spike_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return bad(format!("{name} must be within [0, 1], got {p}"));
            }
        }

        let noise = [
            self.signals.temperature.noise_level,
            self.signals.humidity.noise_level,
            self.signals.moisture.noise_level,
        ];
        if noise.iter().any(|n| !(*n >= 0.0) || !n.is_finite()) {
            return bad("noise levels must be finite and non-negative".into());
        }

        let p = &self.plant;
        let t = &p.temperature;
        if !(t.min_limit.is_finite() && t.max_limit.is_finite() && t.min_limit < t.max_limit) {
            return bad(format!(
                "plant.temperature needs finite min_limit < max_limit, got [{}, {}]",
                t.min_limit, t.max_limit
            ));
        }
        if !p.humidity.min_limit.is_finite() || !p.moisture.min_limit.is_finite() {
            return bad("plant min_limit values must be finite".into());
        }
        let rates = [
            ("plant.temperature.decay_rate", t.decay_rate),
            ("plant.temperature.action_factor", t.action_factor),
            ("plant.humidity.decay_rate", p.humidity.decay_rate),
            ("plant.humidity.action_factor", p.humidity.action_factor),
            ("plant.moisture.decay_rate", p.moisture.decay_rate),
            ("plant.moisture.action_factor", p.moisture.action_factor),
        ];
        for (name, r) in rates {
            if !(r >= 0.0) || !r.is_finite() {
                return bad(format!("{name} must be finite and non-negative, got {r}"));
            }
        }

        Ok(())
    }
}
