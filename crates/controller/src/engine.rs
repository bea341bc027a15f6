use serde::Serialize;
use tracing::trace;

use crate::error::{ConfigError, InferenceError};
use crate::rule::Rule;
use crate::variable::LinguisticVariable;

/// Rule with names resolved to (input index, set index) pairs.
#[derive(Clone, Debug)]
struct CompiledRule {
    antecedents: Vec<(usize, usize)>,
    consequent: usize,
}

/// Mamdani controller: min for AND and implication, max aggregation,
/// discrete centroid defuzzification.
///
/// Stateless between calls; evaluating the same readings twice gives the
/// same action.
#[derive(Clone, Debug, Serialize)]
pub struct FuzzyController {
    name: String,
    inputs: Vec<LinguisticVariable>,
    output: LinguisticVariable,
    rules: Vec<Rule>,
    #[serde(skip)]
    compiled: Vec<CompiledRule>,
    #[serde(skip)]
    grid: Vec<f64>,
    /// Output set degrees over `grid`, one row per output set.
    #[serde(skip)]
    consequent_curves: Vec<Vec<f64>>,
}

impl FuzzyController {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<LinguisticVariable>,
        output: LinguisticVariable,
        rules: Vec<Rule>,
    ) -> Result<Self, ConfigError> {
        for (i, var) in inputs.iter().enumerate() {
            let clash = inputs[..i].iter().any(|v| v.name() == var.name())
                || var.name() == output.name();
            if clash {
                return Err(ConfigError::DuplicateVariable(var.name().to_string()));
            }
        }
        if rules.is_empty() {
            return Err(ConfigError::NoRules);
        }

        let compiled = rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| compile(idx, rule, &inputs, &output))
            .collect::<Result<Vec<_>, _>>()?;

        let grid: Vec<f64> = output.grid().collect();
        let consequent_curves = output
            .sets()
            .iter()
            .map(|s| grid.iter().map(|&x| s.curve.degree(x)).collect())
            .collect();

        Ok(Self {
            name: name.into(),
            inputs,
            output,
            rules,
            compiled,
            grid,
            consequent_curves,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[LinguisticVariable] {
        &self.inputs
    }

    pub fn output(&self) -> &LinguisticVariable {
        &self.output
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Membership degrees of every input reading, indexed `[input][set]`.
    ///
    /// Readings are looked up by variable name (first match wins) and clamped
    /// to the variable's universe.
    pub fn fuzzify(&self, readings: &[(&str, f64)]) -> Result<Vec<Vec<f64>>, InferenceError> {
        self.inputs
            .iter()
            .map(|var| {
                let value = readings
                    .iter()
                    .find(|(name, _)| *name == var.name())
                    .map(|(_, v)| *v)
                    .ok_or_else(|| InferenceError::MissingInput {
                        variable: var.name().to_string(),
                    })?;
                if !value.is_finite() {
                    return Err(InferenceError::NonFiniteInput {
                        variable: var.name().to_string(),
                    });
                }
                Ok(var.fuzzify(var.clamp(value)))
            })
            .collect()
    }

    /// Firing strength of each rule, in rule order.
    pub fn firing_strengths(&self, readings: &[(&str, f64)]) -> Result<Vec<f64>, InferenceError> {
        let degrees = self.fuzzify(readings)?;
        Ok(self
            .compiled
            .iter()
            .map(|rule| {
                rule.antecedents
                    .iter()
                    .map(|&(var, set)| degrees[var][set])
                    .fold(1.0_f64, f64::min)
            })
            .collect())
    }

    /// Aggregated output set as `(x, degree)` over the output grid.
    pub fn aggregate(&self, strengths: &[f64]) -> Vec<(f64, f64)> {
        self.grid
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let degree = self
                    .compiled
                    .iter()
                    .zip(strengths)
                    .map(|(rule, &w)| w.min(self.consequent_curves[rule.consequent][i]))
                    .fold(0.0_f64, f64::max);
                (x, degree)
            })
            .collect()
    }

    pub fn evaluate(&self, readings: &[(&str, f64)]) -> Result<f64, InferenceError> {
        let strengths = self.firing_strengths(readings)?;
        let action = centroid(&self.aggregate(&strengths))?;
        trace!(controller = %self.name, ?strengths, action, "evaluated");
        Ok(action)
    }
}

fn compile(
    idx: usize,
    rule: &Rule,
    inputs: &[LinguisticVariable],
    output: &LinguisticVariable,
) -> Result<CompiledRule, ConfigError> {
    if rule.antecedents.is_empty() {
        return Err(ConfigError::EmptyAntecedent { rule: idx });
    }

    let antecedents = rule
        .antecedents
        .iter()
        .map(|clause| {
            let var = inputs
                .iter()
                .position(|v| v.name() == clause.variable)
                .ok_or_else(|| ConfigError::UnknownVariable {
                    rule: idx,
                    variable: clause.variable.clone(),
                })?;
            let set = inputs[var]
                .set_index(&clause.label)
                .ok_or_else(|| ConfigError::UnknownLabel {
                    rule: idx,
                    variable: clause.variable.clone(),
                    label: clause.label.clone(),
                })?;
            Ok((var, set))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    if rule.consequent.variable != output.name() {
        return Err(ConfigError::ConsequentNotOutput {
            rule: idx,
            variable: rule.consequent.variable.clone(),
        });
    }
    let consequent = output
        .set_index(&rule.consequent.label)
        .ok_or_else(|| ConfigError::UnknownLabel {
            rule: idx,
            variable: rule.consequent.variable.clone(),
            label: rule.consequent.label.clone(),
        })?;

    Ok(CompiledRule {
        antecedents,
        consequent,
    })
}

/// `sum(x * mu) / sum(mu)` over a sampled fuzzy set.
pub fn centroid(points: &[(f64, f64)]) -> Result<f64, InferenceError> {
    let (weighted, area) = points
        .iter()
        .fold((0.0, 0.0), |(wx, w), &(x, mu)| (wx + x * mu, w + mu));
    if area <= 0.0 {
        return Err(InferenceError::NoRuleFired);
    }
    Ok(weighted / area)
}
