use serde::Serialize;

/// `variable is label`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub variable: String,
    pub label: String,
}

impl Clause {
    pub fn new(variable: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            label: label.into(),
        }
    }
}

/// `IF a1 AND a2 ... THEN consequent`. Antecedents combine by minimum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub antecedents: Vec<Clause>,
    pub consequent: Clause,
}

impl Rule {
    /// Starts a rule with its first antecedent clause.
    pub fn when(variable: impl Into<String>, label: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            antecedents: vec![Clause::new(variable, label)],
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuleBuilder {
    antecedents: Vec<Clause>,
}

impl RuleBuilder {
    pub fn and(mut self, variable: impl Into<String>, label: impl Into<String>) -> Self {
        self.antecedents.push(Clause::new(variable, label));
        self
    }

    pub fn then(self, variable: impl Into<String>, label: impl Into<String>) -> Rule {
        Rule {
            antecedents: self.antecedents,
            consequent: Clause::new(variable, label),
        }
    }
}
