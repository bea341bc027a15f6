use serde::Serialize;

use crate::error::ConfigError;

/// Triangular membership curve over breakpoints `a <= b <= c`.
///
/// Degree rises linearly on `[a, b]`, falls linearly on `[b, c]` and is zero
/// outside `[a, c]`. With `a == b` (or `b == c`) the curve collapses into a
/// falling (rising) ramp whose peak sits on the shared breakpoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Triangular {
    a: f64,
    b: f64,
    c: f64,
}

impl Triangular {
    pub fn new(label: &str, [a, b, c]: [f64; 3]) -> Result<Self, ConfigError> {
        // written so that NaN breakpoints are rejected too
        if !(a <= b && b <= c) || !a.is_finite() || !c.is_finite() {
            return Err(ConfigError::UnorderedBreakpoints {
                label: label.to_string(),
                a,
                b,
                c,
            });
        }
        Ok(Self { a, b, c })
    }

    pub fn breakpoints(&self) -> [f64; 3] {
        [self.a, self.b, self.c]
    }

    pub fn degree(&self, x: f64) -> f64 {
        let Self { a, b, c } = *self;
        if x < a || x > c {
            0.0
        } else if x == b {
            1.0
        } else if x < b {
            // a < x < b here, so b - a > 0
            (x - a) / (b - a)
        } else {
            (c - x) / (c - b)
        }
    }
}
