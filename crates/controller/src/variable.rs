use serde::Serialize;

use crate::error::ConfigError;
use crate::membership::Triangular;

/// A labeled fuzzy set on a linguistic variable.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FuzzySet {
    pub label: String,
    pub curve: Triangular,
}

/// Named universe of discourse with its labeled sets.
///
/// Built once through the chained constructors and read-only afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinguisticVariable {
    name: String,
    min: f64,
    max: f64,
    step: f64,
    sets: Vec<FuzzySet>,
}

impl LinguisticVariable {
    pub fn new(
        name: impl Into<String>,
        (min, max): (f64, f64),
        step: f64,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if !(min < max) || !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::EmptyUniverse {
                variable: name,
                min,
                max,
            });
        }
        if !(step > 0.0) || !step.is_finite() {
            return Err(ConfigError::InvalidStep {
                variable: name,
                step,
            });
        }
        Ok(Self {
            name,
            min,
            max,
            step,
            sets: Vec::with_capacity(3),
        })
    }

    /// Adds a triangular set `label` with breakpoints `[a, b, c]`.
    pub fn with_set(
        mut self,
        label: impl Into<String>,
        breakpoints: [f64; 3],
    ) -> Result<Self, ConfigError> {
        let label = label.into();
        if self.sets.iter().any(|s| s.label == label) {
            return Err(ConfigError::DuplicateLabel {
                variable: self.name,
                label,
            });
        }
        let curve = Triangular::new(&label, breakpoints)?;
        self.sets.push(FuzzySet { label, curve });
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn sets(&self) -> &[FuzzySet] {
        &self.sets
    }

    pub fn set_index(&self, label: &str) -> Option<usize> {
        self.sets.iter().position(|s| s.label == label)
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.min, self.max)
    }

    /// Degree of `x` in every set, in declaration order.
    pub fn fuzzify(&self, x: f64) -> Vec<f64> {
        self.sets.iter().map(|s| s.curve.degree(x)).collect()
    }

    /// Discretized universe: `min, min + step, ...` up to and including `max`
    /// when it lies on the grid.
    pub fn grid(&self) -> impl Iterator<Item = f64> + '_ {
        // tolerance keeps `max` on the grid when (max - min) / step is integral
        let n = ((self.max - self.min) / self.step + 1e-9).floor() as usize + 1;
        (0..n).map(move |i| self.min + self.step * i as f64)
    }

    /// Each set sampled over the grid, for charting.
    pub fn sample_curves(&self) -> Vec<(String, Vec<(f64, f64)>)> {
        self.sets
            .iter()
            .map(|s| {
                let points = self.grid().map(|x| (x, s.curve.degree(x))).collect();
                (s.label.clone(), points)
            })
            .collect()
    }
}
