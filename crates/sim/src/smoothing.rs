use std::collections::VecDeque;

/// Trailing mean over the last `window` samples (fewer until the window fills).
#[derive(Clone, Debug)]
pub struct MovingAverage {
    window: usize,
    samples: VecDeque<f64>,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            samples: VecDeque::with_capacity(window),
        }
    }

    /// Pushes `input` and returns the current mean.
    pub fn filter(&mut self, input: f64) -> f64 {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(input);
        self.average()
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }
}
