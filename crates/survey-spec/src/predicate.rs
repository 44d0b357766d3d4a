use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::answers::AnswerSet;
use crate::spec::catalog::CatalogSpec;
use crate::spec::step::StepId;
use crate::validate::CompiledConstraint;

/// Decides whether a step is shown for the current answers.
pub type ConditionFn = Arc<dyn Fn(&AnswerSet) -> bool + Send + Sync>;

/// Accepts or rejects a step's own answer value.
pub type ValidatorFn = Arc<dyn Fn(Option<&Value>) -> bool + Send + Sync>;

/// Step predicates keyed by step id.
///
/// Step records stay plain data; traversal and validation only ever look
/// predicates up here.
#[derive(Clone, Default)]
pub struct PredicateTable {
    conditions: HashMap<StepId, ConditionFn>,
    validators: HashMap<StepId, ValidatorFn>,
}

impl PredicateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles every declarative `condition` and `validation` of the catalog.
    pub fn from_catalog(catalog: &CatalogSpec) -> Self {
        let mut table = Self::new();
        for step in &catalog.steps {
            if let Some(expr) = step.condition.clone() {
                table.conditions.insert(
                    step.id.clone(),
                    Arc::new(move |answers: &AnswerSet| expr.evaluate(answers)),
                );
            }
            if let Some(constraint) = step.validation.clone() {
                let compiled = CompiledConstraint::new(constraint);
                table.validators.insert(
                    step.id.clone(),
                    Arc::new(move |value: Option<&Value>| compiled.satisfies(value)),
                );
            }
        }
        table
    }

    /// Registers or replaces the condition of a step.
    pub fn with_condition<F>(mut self, step_id: impl Into<StepId>, condition: F) -> Self
    where
        F: Fn(&AnswerSet) -> bool + Send + Sync + 'static,
    {
        self.conditions.insert(step_id.into(), Arc::new(condition));
        self
    }

    /// Registers or replaces the validator of a step.
    pub fn with_validator<F>(mut self, step_id: impl Into<StepId>, validator: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(step_id.into(), Arc::new(validator));
        self
    }

    /// Steps without a condition are always shown.
    pub fn condition_holds(&self, step_id: &str, answers: &AnswerSet) -> bool {
        self.conditions
            .get(step_id)
            .is_none_or(|condition| condition(answers))
    }

    pub fn validator(&self, step_id: &str) -> Option<&ValidatorFn> {
        self.validators.get(step_id)
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut conditions: Vec<_> = self.conditions.keys().collect();
        let mut validators: Vec<_> = self.validators.keys().collect();
        conditions.sort();
        validators.sort();
        f.debug_struct("PredicateTable")
            .field("conditions", &conditions)
            .field("validators", &validators)
            .finish()
    }
}
