use std::path::PathBuf;

use thiserror::Error;

use crate::driver::Actuator;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("controller configuration: {0}")]
    Controller(#[from] controller::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("series `{series}` has {actual} samples, expected {expected}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A controller failed for a reason other than reaching no consensus.
    #[error("{actuator} controller failed at step {t}")]
    Inference {
        t: usize,
        actuator: Actuator,
        #[source]
        source: controller::InferenceError,
    },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
