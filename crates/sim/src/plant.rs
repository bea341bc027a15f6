use controller::Actuators;
use serde::{Deserialize, Serialize};

/// Heating pushes toward `max_limit`, cooling toward `min_limit`; with the
/// heater idle the temperature walks back to base by a fixed `decay_rate`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureLaw {
    pub min_limit: f64,
    pub max_limit: f64,
    pub decay_rate: f64,
    pub action_factor: f64,
}

impl Default for TemperatureLaw {
    fn default() -> Self {
        Self {
            min_limit: 5.0,
            max_limit: 25.0,
            decay_rate: 0.05,
            action_factor: 0.05,
        }
    }
}

impl TemperatureLaw {
    pub fn next(&self, prev: f64, base: f64, heating_action: f64) -> f64 {
        let intensity = heating_action / 10.0;
        if intensity > 0.0 {
            prev + (self.max_limit - prev) * intensity * self.action_factor
        } else if intensity < 0.0 {
            prev - (prev - self.min_limit) * intensity.abs() * self.action_factor
        } else if prev > base {
            (prev - self.decay_rate).max(base)
        } else {
            (prev + self.decay_rate).min(base)
        }
    }
}

/// Positive action drags the value toward `min_limit`; otherwise it relaxes
/// toward base by the fraction `decay_rate` of the remaining gap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DryingLaw {
    pub min_limit: f64,
    pub decay_rate: f64,
    pub action_factor: f64,
}

impl Default for DryingLaw {
    fn default() -> Self {
        Self {
            min_limit: 0.0,
            decay_rate: 0.05,
            action_factor: 0.05,
        }
    }
}

impl DryingLaw {
    pub fn next(&self, prev: f64, base: f64, action: f64) -> f64 {
        let intensity = action / 10.0;
        if intensity > 0.0 {
            prev - (prev - self.min_limit) * intensity * self.action_factor
        } else {
            prev + (base - prev) * self.decay_rate
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "PlantParamsToml")]
pub struct PlantParams {
    pub temperature: TemperatureLaw,
    /// Driven by dehumidifier + ventilation.
    pub humidity: DryingLaw,
    /// Driven by ventilation alone.
    pub moisture: DryingLaw,
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            temperature: TemperatureLaw::default(),
            humidity: DryingLaw {
                action_factor: 0.03,
                ..DryingLaw::default()
            },
            moisture: DryingLaw::default(),
        }
    }
}

/// Fields left out of a `[plant.humidity]` or `[plant.moisture]` table.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct DryingLawPatch {
    min_limit: Option<f64>,
    decay_rate: Option<f64>,
    action_factor: Option<f64>,
}

impl DryingLawPatch {
    fn over(self, law: DryingLaw) -> DryingLaw {
        DryingLaw {
            min_limit: self.min_limit.unwrap_or(law.min_limit),
            decay_rate: self.decay_rate.unwrap_or(law.decay_rate),
            action_factor: self.action_factor.unwrap_or(law.action_factor),
        }
    }
}

/// Humidity and moisture share a law but not their defaults, so partial
/// tables are filled from `PlantParams::default()` per quantity.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
struct PlantParamsToml {
    temperature: TemperatureLaw,
    humidity: DryingLawPatch,
    moisture: DryingLawPatch,
}

impl From<PlantParamsToml> for PlantParams {
    fn from(raw: PlantParamsToml) -> Self {
        let defaults = PlantParams::default();
        Self {
            temperature: raw.temperature,
            humidity: raw.humidity.over(defaults.humidity),
            moisture: raw.moisture.over(defaults.moisture),
        }
    }
}

/// True (noise-free) value of each simulated quantity at one timestep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PlantState {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
}

impl PlantState {
    /// Next state from this one, the next step's base values, and the
    /// actions recorded at the previous step.
    pub fn step(&self, p: &PlantParams, base: &PlantState, actions: &Actuators<f64>) -> PlantState {
        PlantState {
            temperature: p.temperature.next(self.temperature, base.temperature, actions.heating),
            humidity: p.humidity.next(
                self.humidity,
                base.humidity,
                actions.dehumidifier + actions.ventilation,
            ),
            moisture: p.moisture.next(self.moisture, base.moisture, actions.ventilation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(15.0, 10.0, 15.5)]
    #[case(24.0, 10.0, 24.05)]
    #[case(15.0, 5.0, 15.25)]
    fn heating_moves_toward_max(#[case] prev: f64, #[case] action: f64, #[case] expected: f64) {
        let next = TemperatureLaw::default().next(prev, 15.0, action);
        assert!((next - expected).abs() < 1e-9, "{next} != {expected}");
    }

    #[rstest]
    #[case(15.0, -10.0, 14.5)]
    #[case(6.0, -10.0, 5.95)]
    fn cooling_moves_toward_min(#[case] prev: f64, #[case] action: f64, #[case] expected: f64) {
        let next = TemperatureLaw::default().next(prev, 15.0, action);
        assert!((next - expected).abs() < 1e-9, "{next} != {expected}");
    }

    #[rstest]
    #[case(20.0, 15.0, 19.95)]
    #[case(10.0, 15.0, 10.05)]
    #[case(15.02, 15.0, 15.0)]
    #[case(14.99, 15.0, 15.0)]
    fn idle_heater_decays_by_fixed_step(
        #[case] prev: f64,
        #[case] base: f64,
        #[case] expected: f64,
    ) {
        let next = TemperatureLaw::default().next(prev, base, 0.0);
        assert!((next - expected).abs() < 1e-9, "{next} != {expected}");
    }

    #[rstest]
    #[case(80.0, 10.0, 77.6)]
    #[case(80.0, 0.0, 79.5)]
    #[case(80.0, -3.0, 79.5)]
    fn humidity_dries_or_relaxes(#[case] prev: f64, #[case] action: f64, #[case] expected: f64) {
        let law = PlantParams::default().humidity;
        let next = law.next(prev, 70.0, action);
        assert!((next - expected).abs() < 1e-9, "{next} != {expected}");
    }

    #[test]
    fn positive_actions_never_push_the_wrong_way() {
        let p = PlantParams::default();
        for prev in [0.0, 5.0, 12.5, 20.0, 24.9, 25.0] {
            for a in [0.1, 1.0, 5.0, 10.0] {
                assert!(p.temperature.next(prev, 15.0, a) >= prev);
                assert!(p.humidity.next(prev, 90.0, a) <= prev);
                assert!(p.moisture.next(prev, 90.0, a) <= prev);
            }
        }
    }

    #[test]
    fn step_couples_actuators_to_quantities() {
        let p = PlantParams::default();
        let prev = PlantState {
            temperature: 15.0,
            humidity: 80.0,
            moisture: 30.0,
        };
        let base = PlantState {
            temperature: 15.0,
            humidity: 70.0,
            moisture: 25.0,
        };
        let actions = Actuators {
            dehumidifier: 4.0,
            ventilation: 6.0,
            heating: 0.0,
        };
        let next = prev.step(&p, &base, &actions);

        assert_eq!(next.temperature, 15.0);
        // (4 + 6) / 10 = 1.0 intensity at factor 0.03
        assert!((next.humidity - 77.6).abs() < 1e-9);
        // 0.6 intensity at factor 0.05
        assert!((next.moisture - 29.1).abs() < 1e-9);
    }
}
