use thiserror::Error;

/// Problems found while assembling a controller. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("set `{label}`: breakpoints must satisfy a <= b <= c, got ({a}, {b}, {c})")]
    UnorderedBreakpoints {
        label: String,
        a: f64,
        b: f64,
        c: f64,
    },

    #[error("variable `{variable}` defines label `{label}` more than once")]
    DuplicateLabel { variable: String, label: String },

    #[error("variable `{variable}`: universe [{min}, {max}] is empty")]
    EmptyUniverse {
        variable: String,
        min: f64,
        max: f64,
    },

    #[error("variable `{variable}`: discretization step {step} must be positive and finite")]
    InvalidStep { variable: String, step: f64 },

    #[error("controller defines variable `{0}` more than once")]
    DuplicateVariable(String),

    #[error("rule {rule} references unknown variable `{variable}`")]
    UnknownVariable { rule: usize, variable: String },

    #[error("rule {rule} references unknown label `{label}` on `{variable}`")]
    UnknownLabel {
        rule: usize,
        variable: String,
        label: String,
    },

    #[error("rule {rule} has no antecedent clause")]
    EmptyAntecedent { rule: usize },

    #[error("rule {rule} concludes on `{variable}`, which is not the output variable")]
    ConsequentNotOutput { rule: usize, variable: String },

    #[error("controller has no rules")]
    NoRules,
}

/// Recoverable outcomes of a single evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// Every grid point of the aggregated output set has degree zero, so the
    /// centroid is undefined.
    #[error("no rule fired; centroid is undefined")]
    NoRuleFired,

    #[error("missing reading for input `{variable}`")]
    MissingInput { variable: String },

    #[error("reading for input `{variable}` is not finite")]
    NonFiniteInput { variable: String },
}
