//! Disturbance generators: daily base curves, sensor noise, spikes and rain.
//!
//! None of these depend on controller output, so whole series are produced
//! before the loop starts.

use std::f64::consts::PI;

use rand::distributions::{Bernoulli, Distribution};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSignal {
    pub base: f64,
    pub amplitude: f64,
    pub noise_level: f64,
}

impl Default for TemperatureSignal {
    fn default() -> Self {
        Self {
            base: 15.0,
            amplitude: 5.0,
            noise_level: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HumiditySignal {
    pub base: f64,
    pub amplitude: f64,
    pub rain_impact: f64,
    pub drying_speed: f64,
    pub noise_level: f64,
    pub spike_chance: f64,
    pub spike_value: f64,
}

impl Default for HumiditySignal {
    fn default() -> Self {
        Self {
            base: 70.0,
            amplitude: 10.0,
            rain_impact: 0.5,
            drying_speed: 0.2,
            noise_level: 6.0,
            spike_chance: 0.05,
            spike_value: 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoistureSignal {
    pub base: f64,
    pub rain_impact: f64,
    pub drying_speed: f64,
    pub noise_level: f64,
}

impl Default for MoistureSignal {
    fn default() -> Self {
        Self {
            base: 25.0,
            rain_impact: 0.5,
            drying_speed: 0.2,
            noise_level: 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RainSignal {
    pub probability: f64,
    pub intensity: f64,
}

impl Default for RainSignal {
    fn default() -> Self {
        Self {
            probability: 0.2,
            intensity: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    pub temperature: TemperatureSignal,
    pub humidity: HumiditySignal,
    pub moisture: MoistureSignal,
    pub rain: RainSignal,
}

/// One simulated quantity over the whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Signal {
    /// Disturbance-free base curve the plant relaxes toward.
    pub base: Vec<f64>,
    /// Additive sensor noise, spikes included.
    pub noise: Vec<f64>,
    /// Open-loop reading: rain-accumulated value plus noise.
    pub observed: Vec<f64>,
}

/// Everything the loop consumes from outside, aligned to `time`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Disturbances {
    /// Hours since start.
    pub time: Vec<f64>,
    pub rain: Vec<f64>,
    pub temperature: Signal,
    pub humidity: Signal,
    pub moisture: Signal,
}

impl Disturbances {
    pub fn generate(
        p: &SignalParams,
        duration_hours: f64,
        resolution_minutes: f64,
        seed: u64,
    ) -> Result<Self, SimError> {
        let stream = |salt: u64| StdRng::seed_from_u64(seed ^ salt);
        let time = generate_time_vector(duration_hours, resolution_minutes);
        let rain = generate_rain_vector(time.len(), &p.rain, &mut stream(0xA1))?;
        let temperature = simulate_temperature(&time, &p.temperature, &mut stream(0xB2))?;
        let humidity = simulate_humidity(&time, &rain, &p.humidity, &mut stream(0xC3))?;
        let moisture = simulate_moisture(&time, &rain, &p.moisture, &mut stream(0xD4))?;

        Ok(Self {
            time,
            rain,
            temperature,
            humidity,
            moisture,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Every base and noise series must line up with `time`.
    pub fn check_aligned(&self) -> Result<(), SimError> {
        let expected = self.time.len();
        let series: [(&'static str, usize); 6] = [
            ("temperature.base", self.temperature.base.len()),
            ("temperature.noise", self.temperature.noise.len()),
            ("humidity.base", self.humidity.base.len()),
            ("humidity.noise", self.humidity.noise.len()),
            ("moisture.base", self.moisture.base.len()),
            ("moisture.noise", self.moisture.noise.len()),
        ];
        match series.into_iter().find(|(_, len)| *len != expected) {
            Some((series, actual)) => Err(SimError::LengthMismatch {
                series,
                expected,
                actual,
            }),
            None => Ok(()),
        }
    }
}

/// Sample times in hours from 0 through `duration_hours` at the given
/// resolution.
pub fn generate_time_vector(duration_hours: f64, resolution_minutes: f64) -> Vec<f64> {
    if !(duration_hours >= 0.0) || !(resolution_minutes > 0.0) {
        return Vec::new();
    }
    let step = resolution_minutes / 60.0;
    // the stop value sits slightly past `duration_hours` so the last point is kept
    let n = ((duration_hours + resolution_minutes / 61.0) / step).ceil() as usize;
    (0..n).map(|k| k as f64 * step).collect()
}

/// Two-state rain process: a dry sample starts raining with `probability`,
/// a wet one keeps raining into the next sample with `probability`.
pub fn generate_rain_vector(
    len: usize,
    p: &RainSignal,
    rng: &mut impl Rng,
) -> Result<Vec<f64>, SimError> {
    check_probability("rain.probability", p.probability)?;

    let mut raining = false;
    let rain = (0..len)
        .map(|_| {
            if raining {
                if rng.gen::<f64>() > p.probability {
                    raining = false;
                }
                p.intensity
            } else if rng.gen::<f64>() < p.probability {
                raining = true;
                p.intensity
            } else {
                0.0
            }
        })
        .collect();
    Ok(rain)
}

pub fn simulate_temperature(
    time: &[f64],
    p: &TemperatureSignal,
    rng: &mut impl Rng,
) -> Result<Signal, SimError> {
    let base = daily_curve(time, p.base, p.amplitude);
    let noise = gaussian(time.len(), p.noise_level, rng)?;
    let observed = base.iter().zip(&noise).map(|(b, n)| b + n).collect();
    Ok(Signal {
        base,
        noise,
        observed,
    })
}

pub fn simulate_humidity(
    time: &[f64],
    rain: &[f64],
    p: &HumiditySignal,
    rng: &mut impl Rng,
) -> Result<Signal, SimError> {
    let base = daily_curve(time, p.base, p.amplitude);
    let wet = accumulate_rain(&base, rain, p.rain_impact, p.drying_speed);

    check_probability("humidity.spike_chance", p.spike_chance)?;
    let spike = Bernoulli::new(p.spike_chance)
        .map_err(|e| SimError::InvalidConfig(e.to_string()))?;
    let noise: Vec<f64> = gaussian(time.len(), p.noise_level, rng)?
        .into_iter()
        .map(|n| if spike.sample(rng) { n + p.spike_value } else { n })
        .collect();

    let observed = wet.iter().zip(&noise).map(|(w, n)| w + n).collect();
    Ok(Signal {
        base,
        noise,
        observed,
    })
}

pub fn simulate_moisture(
    time: &[f64],
    rain: &[f64],
    p: &MoistureSignal,
    rng: &mut impl Rng,
) -> Result<Signal, SimError> {
    let base = vec![p.base; time.len()];
    let wet = accumulate_rain(&base, rain, p.rain_impact, p.drying_speed);
    let noise = gaussian(time.len(), p.noise_level, rng)?;
    let observed = wet.iter().zip(&noise).map(|(w, n)| w + n).collect();
    Ok(Signal {
        base,
        noise,
        observed,
    })
}

/// `level + amplitude * sin(2 pi t / 24)` at each time `t` in hours.
fn daily_curve(time: &[f64], level: f64, amplitude: f64) -> Vec<f64> {
    time.iter()
        .map(|t| level + amplitude * (2.0 * PI * t / 24.0).sin())
        .collect()
}

fn gaussian(len: usize, std_dev: f64, rng: &mut impl Rng) -> Result<Vec<f64>, SimError> {
    let normal = Normal::new(0.0, std_dev)
        .map_err(|e| SimError::InvalidConfig(format!("noise level {std_dev}: {e}")))?;
    Ok((0..len).map(|_| normal.sample(rng)).collect())
}

/// Rain adds `impact` per wet sample; dry samples fall back by `drying`,
/// never below base.
fn accumulate_rain(base: &[f64], rain: &[f64], impact: f64, drying: f64) -> Vec<f64> {
    let mut out = base.to_vec();
    for i in 1..out.len() {
        out[i] = if rain.get(i).is_some_and(|r| *r != 0.0) {
            out[i - 1] + impact
        } else {
            base[i].max(out[i - 1] - drying)
        };
    }
    out
}

fn check_probability(name: &str, p: f64) -> Result<(), SimError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(format!("{name} must be within [0, 1], got {p}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rain(probability: f64) -> RainSignal {
        RainSignal {
            probability,
            intensity: 1.0,
        }
    }

    #[test]
    fn day_at_two_minutes_has_721_points() {
        let t = generate_time_vector(24.0, 2.0);
        assert_eq!(t.len(), 721);
        assert_eq!(t[0], 0.0);
        assert!((t[720] - 24.0).abs() < 1e-9);
        assert!((t[1] - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_time_vector_is_empty() {
        assert!(generate_time_vector(24.0, 0.0).is_empty());
        assert!(generate_time_vector(-1.0, 2.0).is_empty());
    }

    #[test]
    fn rain_is_binary_at_given_intensity() {
        let mut rng = StdRng::seed_from_u64(7);
        let p = RainSignal {
            probability: 0.3,
            intensity: 2.5,
        };
        let rain = generate_rain_vector(500, &p, &mut rng).unwrap();
        assert_eq!(rain.len(), 500);
        assert!(rain.iter().all(|r| *r == 0.0 || *r == 2.5));
        assert!(rain.iter().any(|r| *r > 0.0));
        assert!(rain.iter().any(|r| *r == 0.0));
    }

    #[test]
    fn certain_and_impossible_rain() {
        let mut rng = StdRng::seed_from_u64(1);
        let never = generate_rain_vector(50, &rain(0.0), &mut rng).unwrap();
        assert!(never.iter().all(|r| *r == 0.0));
        let always = generate_rain_vector(50, &rain(1.0), &mut rng).unwrap();
        assert!(always.iter().all(|r| *r == 1.0));
    }

    #[test]
    fn bad_probability_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = generate_rain_vector(5, &rain(1.5), &mut rng);
        assert!(matches!(err, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn temperature_follows_daily_curve() {
        let time = generate_time_vector(24.0, 60.0);
        let p = TemperatureSignal {
            noise_level: 0.0,
            ..TemperatureSignal::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let s = simulate_temperature(&time, &p, &mut rng).unwrap();
        assert!((s.base[0] - 15.0).abs() < 1e-9);
        assert!((s.base[6] - 20.0).abs() < 1e-9);
        assert!((s.base[18] - 10.0).abs() < 1e-9);
        assert!(s.noise.iter().all(|n| *n == 0.0));
        assert_eq!(s.base, s.observed);
    }

    #[test]
    fn rain_accumulates_in_observed_moisture() {
        let time = generate_time_vector(1.0, 10.0);
        let rain = vec![0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let p = MoistureSignal {
            noise_level: 0.0,
            ..MoistureSignal::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let s = simulate_moisture(&time, &rain, &p, &mut rng).unwrap();
        assert_eq!(s.base, vec![25.0; 7]);
        let expected = [25.0, 25.5, 26.0, 26.5, 26.3, 26.1, 25.9];
        for (o, e) in s.observed.iter().zip(expected) {
            assert!((o - e).abs() < 1e-9, "{o} != {e}");
        }
    }

    #[test]
    fn spikes_show_up_in_humidity_noise() {
        let time = generate_time_vector(24.0, 2.0);
        let p = HumiditySignal {
            noise_level: 0.0,
            spike_chance: 1.0,
            ..HumiditySignal::default()
        };
        let rain = vec![0.0; time.len()];
        let mut rng = StdRng::seed_from_u64(9);
        let s = simulate_humidity(&time, &rain, &p, &mut rng).unwrap();
        assert!(s.noise.iter().all(|n| *n == 15.0));
    }

    #[test]
    fn same_seed_same_disturbances() {
        let p = SignalParams::default();
        let a = Disturbances::generate(&p, 2.0, 2.0, 42).unwrap();
        let b = Disturbances::generate(&p, 2.0, 2.0, 42).unwrap();
        let c = Disturbances::generate(&p, 2.0, 2.0, 43).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.temperature.noise, c.temperature.noise);
        assert!(a.check_aligned().is_ok());
    }

    #[test]
    fn misaligned_series_are_reported() {
        let p = SignalParams::default();
        let mut d = Disturbances::generate(&p, 1.0, 2.0, 1).unwrap();
        d.moisture.noise.pop();
        assert!(matches!(
            d.check_aligned(),
            Err(SimError::LengthMismatch {
                series: "moisture.noise",
                ..
            })
        ));
    }
}
