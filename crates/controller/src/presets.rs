//! The three climate controllers and the separately kept charting definitions.
//!
//! Each controller owns its own variable definitions. The breakpoints used for
//! charting differ slightly from the controllers' own (temperature most of all)
//! and are kept as a separate value.

use serde::{Deserialize, Serialize};

use crate::engine::FuzzyController;
use crate::error::{ConfigError, InferenceError};
use crate::rule::Rule;
use crate::variable::LinguisticVariable;

pub const ACTION_RANGE: (f64, f64) = (-10.0, 10.0);

fn variable(
    name: &str,
    range: (f64, f64),
    sets: [(&str, [f64; 3]); 3],
) -> Result<LinguisticVariable, ConfigError> {
    let var = LinguisticVariable::new(name, range, 1.0)?;
    sets.into_iter()
        .try_fold(var, |v, (label, bp)| v.with_set(label, bp))
}

fn off_low_high(name: &str) -> Result<LinguisticVariable, ConfigError> {
    variable(
        name,
        ACTION_RANGE,
        [
            ("off", [-10.0, -10.0, 1.0]),
            ("low", [0.0, 1.5, 3.0]),
            ("high", [2.0, 10.0, 10.0]),
        ],
    )
}

fn cool_off_on(name: &str) -> Result<LinguisticVariable, ConfigError> {
    variable(
        name,
        ACTION_RANGE,
        [
            ("cool", [-10.0, -10.0, 0.0]),
            ("off", [-5.0, 0.0, 5.0]),
            ("on", [0.0, 10.0, 10.0]),
        ],
    )
}

fn ventilation_humidity() -> Result<LinguisticVariable, ConfigError> {
    variable(
        "humidity",
        (0.0, 100.0),
        [
            ("low", [0.0, 0.0, 60.0]),
            ("medium", [55.0, 65.0, 75.0]),
            ("high", [70.0, 100.0, 100.0]),
        ],
    )
}

fn moisture() -> Result<LinguisticVariable, ConfigError> {
    variable(
        "moisture",
        (0.0, 100.0),
        [
            ("low", [0.0, 0.0, 15.0]),
            ("medium", [10.0, 15.0, 20.0]),
            ("high", [15.0, 100.0, 100.0]),
        ],
    )
}

/// humidity -> dehumidifier intensity.
pub fn dehumidifier() -> Result<FuzzyController, ConfigError> {
    let humidity = variable(
        "humidity",
        (0.0, 100.0),
        [
            ("low", [0.0, 0.0, 50.0]),
            ("medium", [45.0, 60.0, 75.0]),
            ("high", [70.0, 100.0, 100.0]),
        ],
    )?;
    let rules = vec![
        Rule::when("humidity", "high").then("dehumidifier", "high"),
        Rule::when("humidity", "medium").then("dehumidifier", "low"),
        Rule::when("humidity", "low").then("dehumidifier", "off"),
    ];
    let output = off_low_high("dehumidifier")?;
    FuzzyController::new("dehumidifier", vec![humidity], output, rules)
}

/// humidity x moisture -> ventilation intensity.
pub fn ventilation() -> Result<FuzzyController, ConfigError> {
    let v = "ventilation";
    let rule = |h: &str, m: &str, out: &str| {
        Rule::when("humidity", h).and("moisture", m).then(v, out)
    };
    let rules = vec![
        rule("high", "high", "high"),
        rule("high", "medium", "high"),
        rule("high", "low", "high"),
        rule("medium", "high", "high"),
        rule("medium", "medium", "low"),
        rule("low", "high", "high"),
        rule("medium", "low", "low"),
        rule("low", "medium", "low"),
        rule("low", "low", "off"),
    ];
    let inputs = vec![ventilation_humidity()?, moisture()?];
    FuzzyController::new(v, inputs, off_low_high(v)?, rules)
}

/// temperature -> heating intensity (negative values cool).
pub fn heating() -> Result<FuzzyController, ConfigError> {
    let temperature = variable(
        "temperature",
        (0.0, 30.0),
        [
            ("cold", [0.0, 0.0, 19.0]),
            ("medium", [18.0, 20.0, 22.0]),
            ("hot", [21.0, 30.0, 30.0]),
        ],
    )?;
    let rules = vec![
        Rule::when("temperature", "hot").then("heating", "cool"),
        Rule::when("temperature", "medium").then("heating", "off"),
        Rule::when("temperature", "cold").then("heating", "on"),
    ];
    FuzzyController::new("heating", vec![temperature], cool_off_on("heating")?, rules)
}

/// Variable definitions used for charting membership curves.
pub fn plot_reference() -> Result<Vec<LinguisticVariable>, ConfigError> {
    let temperature = variable(
        "temperature",
        (0.0, 30.0),
        [
            ("cold", [0.0, 0.0, 21.0]),
            ("medium", [20.0, 22.5, 25.0]),
            ("hot", [24.0, 30.0, 30.0]),
        ],
    )?;
    Ok(vec![
        temperature,
        ventilation_humidity()?,
        moisture()?,
        cool_off_on("heating")?,
        off_low_high("dehumidifier")?,
        off_low_high("ventilation")?,
    ])
}

/// Smoothed sensor snapshot fed to all controllers in one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SensorReadings {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
}

impl SensorReadings {
    pub fn as_inputs(&self) -> [(&'static str, f64); 3] {
        [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("moisture", self.moisture),
        ]
    }
}

/// One value per actuator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Actuators<T> {
    pub dehumidifier: T,
    pub ventilation: T,
    pub heating: T,
}

impl<T> Actuators<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Actuators<U> {
        Actuators {
            dehumidifier: f(self.dehumidifier),
            ventilation: f(self.ventilation),
            heating: f(self.heating),
        }
    }
}

/// Per-actuator outcome of one bank evaluation.
pub type Decisions = Actuators<Result<f64, InferenceError>>;

/// The three controllers evaluated together on one snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct ClimateControllers {
    pub dehumidifier: FuzzyController,
    pub ventilation: FuzzyController,
    pub heating: FuzzyController,
}

impl ClimateControllers {
    pub fn standard() -> Result<Self, ConfigError> {
        Ok(Self {
            dehumidifier: dehumidifier()?,
            ventilation: ventilation()?,
            heating: heating()?,
        })
    }

    /// Evaluates every controller whose actuator is not pinned; pinned
    /// actuators report their pinned value without running inference.
    pub fn decide(&self, readings: &SensorReadings, pinned: &Actuators<Option<f64>>) -> Decisions {
        let inputs = readings.as_inputs();
        let run = |pin: Option<f64>, c: &FuzzyController| match pin {
            Some(v) => Ok(v),
            None => c.evaluate(&inputs),
        };
        Actuators {
            dehumidifier: run(pinned.dehumidifier, &self.dehumidifier),
            ventilation: run(pinned.ventilation, &self.ventilation),
            heating: run(pinned.heating, &self.heating),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_bank_builds() {
        let bank = ClimateControllers::standard().unwrap();
        assert_eq!(bank.dehumidifier.rules().len(), 3);
        assert_eq!(bank.ventilation.rules().len(), 9);
        assert_eq!(bank.heating.rules().len(), 3);
        assert_eq!(bank.ventilation.inputs().len(), 2);
        for c in [&bank.dehumidifier, &bank.ventilation, &bank.heating] {
            assert_eq!(c.output().range(), ACTION_RANGE);
            assert_eq!(c.output().sets().len(), 3);
        }
    }

    #[test]
    fn very_humid_air_runs_dehumidifier_high() {
        let c = dehumidifier().unwrap();
        let action = c.evaluate(&[("humidity", 90.0)]).unwrap();
        assert!(action > 10.0 / 3.0, "action = {action}");
    }

    #[test]
    fn dry_air_and_soil_keep_ventilation_off() {
        let action = ventilation()
            .unwrap()
            .evaluate(&[("humidity", 50.0), ("moisture", 5.0)])
            .unwrap();
        assert!(action < -4.0, "action = {action}");
    }

    #[test]
    fn cold_room_turns_heating_on() {
        let c = heating().unwrap();
        let action = c.evaluate(&[("temperature", 15.0)]).unwrap();
        assert!(action > 4.0, "action = {action}");
    }

    #[test]
    fn comfortable_room_leaves_heating_near_off() {
        let c = heating().unwrap();
        let action = c.evaluate(&[("temperature", 20.0)]).unwrap();
        assert!(action.abs() < 0.5, "action = {action}");
    }

    #[test]
    fn bank_uses_each_controller_inputs() {
        let bank = ClimateControllers::standard().unwrap();
        let d = bank.decide(
            &SensorReadings {
                temperature: 15.0,
                humidity: 90.0,
                moisture: 5.0,
            },
            &Actuators::default(),
        );
        let heat = heating().unwrap().evaluate(&[("temperature", 15.0)]);
        assert_eq!(d.heating, heat);
        let dry = dehumidifier().unwrap().evaluate(&[("humidity", 90.0)]);
        assert_eq!(d.dehumidifier, dry);
        assert!(d.ventilation.unwrap() > 0.0);
    }

    #[test]
    fn pinned_actuator_skips_inference() {
        let bank = ClimateControllers::standard().unwrap();
        let pinned = Actuators {
            heating: Some(0.0),
            ..Actuators::default()
        };
        let d = bank.decide(
            &SensorReadings {
                temperature: 5.0,
                humidity: 50.0,
                moisture: 5.0,
            },
            &pinned,
        );
        assert_eq!(d.heating, Ok(0.0));
        assert!(d.dehumidifier.is_ok());
    }

    #[test]
    fn plotting_temperature_differs_from_controller() {
        let plotted = plot_reference().unwrap();
        let controller = heating().unwrap();
        assert_eq!(plotted.len(), 6);
        assert_eq!(plotted[0].name(), "temperature");
        assert_ne!(plotted[0].sets(), controller.inputs()[0].sets());
        assert_eq!(plotted[0].sets()[1].curve.breakpoints(), [20.0, 22.5, 25.0]);
    }
}
