//! Comfort-band response metrics over recorded series.

use serde::Serialize;

/// Inclusive band; a missing side is unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ComfortBand {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ComfortBand {
    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn at_most(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lower.map_or(true, |lo| v >= lo) && self.upper.map_or(true, |hi| v <= hi)
    }
}

/// Target bands for the three climate quantities.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ComfortTargets {
    pub temperature: ComfortBand,
    pub humidity: ComfortBand,
    pub moisture: ComfortBand,
}

impl Default for ComfortTargets {
    fn default() -> Self {
        Self {
            temperature: ComfortBand::between(18.0, 22.0),
            humidity: ComfortBand::between(40.0, 60.0),
            moisture: ComfortBand::at_most(20.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BandResponse {
    Settled {
        /// Time of the first in-band sample.
        rise_time_h: f64,
        /// In-band samples over samples from the rise time onward.
        stability: f64,
    },
    NeverEntered,
}

impl BandResponse {
    pub fn rise_time(&self) -> Option<f64> {
        match self {
            BandResponse::Settled { rise_time_h, .. } => Some(*rise_time_h),
            BandResponse::NeverEntered => None,
        }
    }
}

/// Rise time and stability of `series` (sampled at `time`) against `band`.
///
/// Only the common prefix of `time` and `series` is assessed; trailing
/// samples of the longer slice are ignored.
pub fn assess(time: &[f64], series: &[f64], band: &ComfortBand) -> BandResponse {
    let samples = time.len().min(series.len());
    let series = &series[..samples];
    let Some(first) = series.iter().position(|v| band.contains(*v)) else {
        return BandResponse::NeverEntered;
    };

    let inside = series.iter().filter(|v| band.contains(**v)).count();
    BandResponse::Settled {
        rise_time_h: time[first],
        stability: inside as f64 / (samples - first) as f64,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ComfortReport {
    pub temperature: BandResponse,
    pub humidity: BandResponse,
    pub moisture: BandResponse,
}

impl ComfortReport {
    pub fn evaluate(
        targets: &ComfortTargets,
        time: &[f64],
        temperature: &[f64],
        humidity: &[f64],
        moisture: &[f64],
    ) -> Self {
        Self {
            temperature: assess(time, temperature, &targets.temperature),
            humidity: assess(time, humidity, &targets.humidity),
            moisture: assess(time, moisture, &targets.moisture),
        }
    }
}
