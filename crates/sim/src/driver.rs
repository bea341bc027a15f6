use std::fmt;

use controller::{Actuators, ClimateControllers, InferenceError, SensorReadings};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{FallbackPolicy, SimConfig};
use crate::error::SimError;
use crate::plant::PlantState;
use crate::signals::Disturbances;
use crate::smoothing::MovingAverage;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantity {
    Temperature,
    Humidity,
    Moisture,
}

impl Quantity {
    pub const ALL: [Quantity; 3] = [Self::Temperature, Self::Humidity, Self::Moisture];

    pub fn of(self, s: &PlantState) -> f64 {
        match self {
            Self::Temperature => s.temperature,
            Self::Humidity => s.humidity,
            Self::Moisture => s.moisture,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Actuator {
    Dehumidifier,
    Ventilation,
    Heating,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [Self::Dehumidifier, Self::Ventilation, Self::Heating];

    pub fn of<T: Copy>(self, a: &Actuators<T>) -> T {
        match self {
            Self::Dehumidifier => a.dehumidifier,
            Self::Ventilation => a.ventilation,
            Self::Heating => a.heating,
        }
    }

    fn slot<T>(self, a: &mut Actuators<T>) -> &mut T {
        match self {
            Self::Dehumidifier => &mut a.dehumidifier,
            Self::Ventilation => &mut a.ventilation,
            Self::Heating => &mut a.heating,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Moisture => "moisture",
        })
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dehumidifier => "dehumidifier",
            Self::Ventilation => "ventilation",
            Self::Heating => "heating",
        })
    }
}

/// Everything recorded at one timestep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Step {
    pub t: usize,
    pub time_h: f64,
    pub base: PlantState,
    pub noise: PlantState,
    pub updated: PlantState,
    pub smoothed: SensorReadings,
    pub actions: Actuators<f64>,
    /// Controllers ran at this step (otherwise actions were held over).
    pub recomputed: bool,
    /// Actuators whose controller reached no consensus at this step.
    pub fallbacks: Actuators<bool>,
}

/// Recorded run, indexed by timestep.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Trace {
    pub steps: Vec<Step>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn time(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.time_h).collect()
    }

    pub fn updated(&self, q: Quantity) -> Vec<f64> {
        self.steps.iter().map(|s| q.of(&s.updated)).collect()
    }

    pub fn base(&self, q: Quantity) -> Vec<f64> {
        self.steps.iter().map(|s| q.of(&s.base)).collect()
    }

    pub fn actions(&self, a: Actuator) -> Vec<f64> {
        self.steps.iter().map(|s| a.of(&s.actions)).collect()
    }

    pub fn fallback_count(&self, a: Actuator) -> usize {
        self.steps.iter().filter(|s| a.of(&s.fallbacks)).count()
    }
}

/// Closed loop: plant update with one-step actuator lag, noisy readings,
/// smoothing, fuzzy decisions.
#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimConfig,
    controllers: ClimateControllers,
}

impl Simulation {
    pub fn new(config: SimConfig, controllers: ClimateControllers) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            config,
            controllers,
        })
    }

    /// Simulation with the standard dehumidifier, ventilation and heating
    /// controllers.
    pub fn standard(config: SimConfig) -> Result<Self, SimError> {
        Self::new(config, ClimateControllers::standard()?)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn controllers(&self) -> &ClimateControllers {
        &self.controllers
    }

    /// Disturbances for this configuration's duration, resolution and seed.
    pub fn disturbances(&self) -> Result<Disturbances, SimError> {
        let c = &self.config;
        Disturbances::generate(&c.signals, c.duration_hours, c.resolution_minutes, c.seed)
    }

    pub fn run(&self, d: &Disturbances) -> Result<Trace, SimError> {
        d.check_aligned()?;
        let cfg = &self.config;
        info!(
            steps = d.len(),
            update_interval = cfg.update_interval,
            fallback = ?cfg.fallback,
            "simulation started"
        );

        let window = cfg.smoothing_window;
        let mut filters = [(); 3].map(|_| MovingAverage::new(window));
        let mut steps: Vec<Step> = Vec::with_capacity(d.len());

        for t in 0..d.len() {
            let base = PlantState {
                temperature: d.temperature.base[t],
                humidity: d.humidity.base[t],
                moisture: d.moisture.base[t],
            };
            let noise = PlantState {
                temperature: d.temperature.noise[t],
                humidity: d.humidity.noise[t],
                moisture: d.moisture.noise[t],
            };

            let previous = steps.last();
            let updated = match previous {
                Some(prev) => prev.updated.step(&cfg.plant, &base, &prev.actions),
                None => base,
            };

            let [ft, fh, fm] = &mut filters;
            let smoothed = SensorReadings {
                temperature: ft.filter(updated.temperature + noise.temperature),
                humidity: fh.filter(updated.humidity + noise.humidity),
                moisture: fm.filter(updated.moisture + noise.moisture),
            };

            let held = previous.map(|p| p.actions).unwrap_or_default();
            let recomputed = t % cfg.update_interval == 0;
            let (actions, fallbacks) = if recomputed {
                self.decide(t, &smoothed, held)?
            } else {
                (held, Actuators::default())
            };

            debug!(t, ?smoothed, ?actions, recomputed, "step");
            steps.push(Step {
                t,
                time_h: d.time[t],
                base,
                noise,
                updated,
                smoothed,
                actions,
                recomputed,
                fallbacks,
            });
        }

        let trace = Trace { steps };
        let fallbacks: usize = Actuator::ALL.iter().map(|a| trace.fallback_count(*a)).sum();
        info!(steps = trace.len(), fallbacks, "simulation finished");
        Ok(trace)
    }

    fn decide(
        &self,
        t: usize,
        readings: &SensorReadings,
        held: Actuators<f64>,
    ) -> Result<(Actuators<f64>, Actuators<bool>), SimError> {
        let decisions = self.controllers.decide(readings, &self.config.pinned);
        let mut fallbacks = Actuators::default();
        let mut actions = held;

        let outcomes = [
            (Actuator::Dehumidifier, decisions.dehumidifier),
            (Actuator::Ventilation, decisions.ventilation),
            (Actuator::Heating, decisions.heating),
        ];
        for (actuator, outcome) in outcomes {
            let action = match outcome {
                Ok(action) => action,
                Err(InferenceError::NoRuleFired) => {
                    *actuator.slot(&mut fallbacks) = true;
                    let action = match self.config.fallback {
                        FallbackPolicy::HoldPrevious => actuator.of(&held),
                        FallbackPolicy::Zero => 0.0,
                    };
                    warn!(t, %actuator, action, "no rule fired, controller fallback");
                    action
                }
                Err(source) => {
                    return Err(SimError::Inference {
                        t,
                        actuator,
                        source,
                    });
                }
            };
            *actuator.slot(&mut actions) = action;
        }
        Ok((actions, fallbacks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::Signal;

    fn flat(len: usize, temperature: f64, humidity: f64, moisture: f64) -> Disturbances {
        let signal = |v: f64| Signal {
            base: vec![v; len],
            noise: vec![0.0; len],
            observed: vec![v; len],
        };
        Disturbances {
            time: (0..len).map(|k| k as f64 / 30.0).collect(),
            rain: vec![0.0; len],
            temperature: signal(temperature),
            humidity: signal(humidity),
            moisture: signal(moisture),
        }
    }

    /// Heating that only has an opinion on readings between 10 and 20.
    fn narrow_bank(input: &str) -> ClimateControllers {
        use controller::{FuzzyController, LinguisticVariable, Rule};

        let temperature = LinguisticVariable::new(input, (0.0, 30.0), 1.0)
            .and_then(|v| v.with_set("warm", [10.0, 15.0, 20.0]))
            .unwrap();
        let heating = LinguisticVariable::new("heating", (-10.0, 10.0), 1.0)
            .and_then(|v| v.with_set("on", [0.0, 10.0, 10.0]))
            .unwrap();
        let rules = vec![Rule::when(input, "warm").then("heating", "on")];
        let heating = FuzzyController::new("heating", vec![temperature], heating, rules);
        ClimateControllers {
            heating: heating.unwrap(),
            ..ClimateControllers::standard().unwrap()
        }
    }

    #[test]
    fn first_step_starts_from_base() {
        let sim = Simulation::standard(SimConfig::default()).unwrap();
        let trace = sim.run(&flat(10, 15.0, 70.0, 25.0)).unwrap();
        let s0 = &trace.steps[0];
        assert_eq!(s0.updated, s0.base);
        assert!(s0.recomputed);
        assert!(s0.actions.heating > 0.0);
    }

    #[test]
    fn plant_uses_previous_step_actions() {
        let sim = Simulation::standard(SimConfig::default()).unwrap();
        let trace = sim.run(&flat(20, 15.0, 70.0, 25.0)).unwrap();
        let p = &sim.config().plant;
        for pair in trace.steps.windows(2) {
            let expected = pair[0].updated.step(p, &pair[1].base, &pair[0].actions);
            assert_eq!(pair[1].updated, expected);
        }
    }

    #[test]
    fn update_interval_holds_actions() {
        let cfg = SimConfig {
            update_interval: 3,
            ..SimConfig::default()
        };
        let sim = Simulation::standard(cfg).unwrap();
        let trace = sim.run(&flat(12, 15.0, 70.0, 25.0)).unwrap();
        for s in &trace.steps[1..] {
            assert_eq!(s.recomputed, s.t % 3 == 0);
            if !s.recomputed {
                assert_eq!(s.actions, trace.steps[s.t - 1].actions);
            }
        }
    }

    #[test]
    fn pinned_heating_stays_pinned() {
        let cfg = SimConfig {
            pinned: Actuators {
                heating: Some(0.0),
                ..Actuators::default()
            },
            ..SimConfig::default()
        };
        let sim = Simulation::standard(cfg).unwrap();
        let trace = sim.run(&flat(30, 10.0, 70.0, 25.0)).unwrap();
        assert!(trace.actions(Actuator::Heating).iter().all(|a| *a == 0.0));
        let temperature = trace.updated(Quantity::Temperature);
        assert!(temperature.iter().all(|t| *t == 10.0));
    }

    #[test]
    fn hold_previous_at_first_step_records_zero() {
        let bank = narrow_bank("temperature");
        let sim = Simulation::new(SimConfig::default(), bank).unwrap();
        let trace = sim.run(&flat(5, 24.0, 50.0, 10.0)).unwrap();
        let s0 = &trace.steps[0];
        assert!(s0.fallbacks.heating);
        assert_eq!(s0.actions.heating, 0.0);
        assert!(!s0.fallbacks.ventilation);
        // nothing fires later either, so zero is held throughout
        assert_eq!(trace.fallback_count(Actuator::Heating), 5);
        assert!(trace.actions(Actuator::Heating).iter().all(|a| *a == 0.0));
    }

    #[test]
    fn non_finite_reading_is_an_error_not_a_fallback() {
        let sim = Simulation::standard(SimConfig::default()).unwrap();
        let mut d = flat(6, 15.0, 70.0, 25.0);
        d.temperature.noise[3] = f64::NAN;
        match sim.run(&d) {
            Err(SimError::Inference { t, actuator, source }) => {
                assert_eq!(t, 3);
                assert_eq!(actuator, Actuator::Heating);
                assert!(matches!(source, InferenceError::NonFiniteInput { .. }));
            }
            other => panic!("expected inference error, got {other:?}"),
        }
    }

    #[test]
    fn missing_input_is_an_error_not_a_fallback() {
        let bank = narrow_bank("pressure");
        let sim = Simulation::new(SimConfig::default(), bank).unwrap();
        let err = sim.run(&flat(3, 15.0, 70.0, 25.0)).unwrap_err();
        assert!(matches!(
            err,
            SimError::Inference {
                t: 0,
                actuator: Actuator::Heating,
                source: InferenceError::MissingInput { .. },
            }
        ));
    }

    #[test]
    fn empty_disturbances_give_empty_trace() {
        let sim = Simulation::standard(SimConfig::default()).unwrap();
        assert!(sim.run(&Disturbances::default()).unwrap().is_empty());
    }

    #[test]
    fn misaligned_input_is_rejected() {
        let sim = Simulation::standard(SimConfig::default()).unwrap();
        let mut d = flat(5, 15.0, 70.0, 25.0);
        d.humidity.base.truncate(3);
        assert!(matches!(sim.run(&d), Err(SimError::LengthMismatch { .. })));
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let cfg = SimConfig {
            update_interval: 0,
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::standard(cfg), Err(SimError::InvalidConfig(_))));
    }
}
