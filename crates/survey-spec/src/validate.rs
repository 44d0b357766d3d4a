use std::collections::BTreeSet;

use regex::Regex;
use serde_json::Value;

use crate::answers::AnswerSet;
use crate::predicate::PredicateTable;
use crate::spec::catalog::CatalogSpec;
use crate::spec::step::{Constraint, StepSpec, StepType};

pub const DEFAULT_VALIDATION_MESSAGE: &str = "Please provide a valid answer.";
pub const CONSENT_MESSAGE: &str = "Please agree to the terms to continue.";

/// Outcome of gating a step before advancing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepCheck {
    Pass,
    Fail { message: String },
}

impl StepCheck {
    pub fn is_pass(&self) -> bool {
        matches!(self, StepCheck::Pass)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            StepCheck::Pass => None,
            StepCheck::Fail { message } => Some(message),
        }
    }
}

/// Runs the validation predicate and consent check of one step.
///
/// A step blocks when its predicate rejects the current value, or when it
/// declares a consent key whose answer is not `true`. No side effects.
pub fn validate_step(step: &StepSpec, table: &PredicateTable, answers: &AnswerSet) -> StepCheck {
    if let Some(validator) = table.validator(&step.id) {
        let value = step.input_key.as_deref().and_then(|key| answers.get(key));
        if !validator(value) {
            return StepCheck::Fail {
                message: step
                    .validation_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_VALIDATION_MESSAGE.to_string()),
            };
        }
    }

    if let Some(consent_key) = &step.consent_key
        && !answers.get_bool(consent_key)
    {
        return StepCheck::Fail {
            message: CONSENT_MESSAGE.to_string(),
        };
    }

    StepCheck::Pass
}

/// A [`Constraint`] with its pattern compiled once.
#[derive(Debug, Clone)]
pub struct CompiledConstraint {
    constraint: Constraint,
    pattern: Option<Regex>,
}

impl CompiledConstraint {
    /// Compiles the pattern; an invalid pattern is dropped (see [`check_catalog`]).
    pub fn new(constraint: Constraint) -> Self {
        let pattern = constraint.pattern.as_deref().and_then(|pattern| {
            Regex::new(pattern)
                .map_err(|err| tracing::warn!(%pattern, %err, "ignoring invalid validation pattern"))
                .ok()
        });
        Self {
            constraint,
            pattern,
        }
    }

    pub fn satisfies(&self, value: Option<&Value>) -> bool {
        let constraint = &self.constraint;
        let value = match value {
            Some(Value::Null) | None => return constraint.is_empty(),
            Some(value) => value,
        };

        if constraint.required && !is_filled(value) {
            return false;
        }
        if constraint.list && !value.is_array() {
            return false;
        }

        if let Some(regex) = &self.pattern {
            match scalar_text(value) {
                Some(text) if regex.is_match(&text) => {}
                _ => return false,
            }
        }

        if constraint.min_len.is_some() || constraint.max_len.is_some() {
            let Some(text) = scalar_text(value) else {
                return false;
            };
            let len = text.chars().count();
            if constraint.min_len.is_some_and(|min| len < min)
                || constraint.max_len.is_some_and(|max| len > max)
            {
                return false;
            }
        }

        if constraint.min.is_some() || constraint.max.is_some() {
            let Some(number) = numeric(value) else {
                return false;
            };
            if constraint.min.is_some_and(|min| number < min)
                || constraint.max.is_some_and(|max| number > max)
            {
                return false;
            }
        }

        if constraint.min_items.is_some() || constraint.max_items.is_some() {
            let Some(items) = value.as_array() else {
                return false;
            };
            if constraint.min_items.is_some_and(|min| items.len() < min)
                || constraint.max_items.is_some_and(|max| items.len() > max)
            {
                return false;
            }
        }

        true
    }
}

fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// A single problem found while checking a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub step_id: Option<String>,
    pub code: &'static str,
    pub message: String,
}

/// Result of [`check_catalog`].
#[derive(Debug, Clone, Default)]
pub struct CatalogReport {
    pub errors: Vec<CatalogIssue>,
    pub warnings: Vec<CatalogIssue>,
}

impl CatalogReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, step: Option<&StepSpec>, code: &'static str, message: String) {
        self.errors.push(CatalogIssue {
            step_id: step.map(|step| step.id.clone()),
            code,
            message,
        });
    }

    fn warn(&mut self, step: Option<&StepSpec>, code: &'static str, message: String) {
        self.warnings.push(CatalogIssue {
            step_id: step.map(|step| step.id.clone()),
            code,
            message,
        });
    }
}

/// Structural checks over a catalog before a session is started.
pub fn check_catalog(catalog: &CatalogSpec) -> CatalogReport {
    let mut report = CatalogReport::default();
    let mut step_ids = BTreeSet::new();
    let known_keys: BTreeSet<&str> = catalog
        .steps
        .iter()
        .flat_map(|step| [step.input_key.as_deref(), step.consent_key.as_deref()])
        .flatten()
        .collect();

    for step in &catalog.steps {
        if !step_ids.insert(step.id.as_str()) {
            report.error(
                Some(step),
                "duplicate_step",
                format!("step id '{}' is used more than once", step.id),
            );
        }

        if step.kind.is_choice() {
            if step.options.is_empty() {
                report.error(
                    Some(step),
                    "missing_options",
                    format!("{} step '{}' has no options", step.kind, step.id),
                );
            }
            if step.input_key.is_none() {
                report.error(
                    Some(step),
                    "missing_input_key",
                    format!("{} step '{}' has no input key", step.kind, step.id),
                );
            }
        }
        if step.kind.is_text_input() && step.input_key.is_none() {
            report.error(
                Some(step),
                "missing_input_key",
                format!("{} step '{}' has no input key", step.kind, step.id),
            );
        }

        let mut option_ids = BTreeSet::new();
        for option in &step.options {
            if !option_ids.insert(option.id.as_str()) {
                report.error(
                    Some(step),
                    "duplicate_option",
                    format!("option '{}' appears twice in step '{}'", option.id, step.id),
                );
            }
        }
        if step.options.iter().filter(|option| option.exclusive).count() > 1 {
            report.warn(
                Some(step),
                "multiple_exclusive",
                format!("step '{}' declares more than one exclusive option", step.id),
            );
        }

        if let Some(section) = &step.section
            && catalog.section(section).is_none()
        {
            report.error(
                Some(step),
                "unknown_section",
                format!("step '{}' refers to undeclared section '{}'", step.id, section),
            );
        }
        if step.is_section_marker() && step.section.is_none() {
            report.error(
                Some(step),
                "marker_without_section",
                format!("section marker '{}' has no section id", step.id),
            );
        }

        if let Some(condition) = &step.condition {
            for key in condition.referenced_keys() {
                if !known_keys.contains(key) {
                    report.warn(
                        Some(step),
                        "unknown_condition_key",
                        format!("condition of '{}' reads unknown key '{}'", step.id, key),
                    );
                }
            }
        }

        if let Some(pattern) = step
            .validation
            .as_ref()
            .and_then(|constraint| constraint.pattern.as_deref())
            && let Err(err) = Regex::new(pattern)
        {
            report.error(
                Some(step),
                "invalid_pattern",
                format!("validation pattern of '{}' does not compile: {}", step.id, err),
            );
        }
    }

    if catalog.first_of(StepType::Loading).is_some() && catalog.first_of(StepType::Results).is_none()
    {
        report.error(
            None,
            "missing_results",
            "catalog has a loading step but no results step".into(),
        );
    }

    if let Some(last) = catalog.steps.last()
        && last.is_section_marker()
    {
        report.warn(
            Some(last),
            "trailing_marker",
            format!("section marker '{}' is the last step", last.id),
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiled(value: Value) -> CompiledConstraint {
        CompiledConstraint::new(serde_json::from_value(value).expect("constraint"))
    }

    #[test]
    fn required_rejects_blank_text() {
        let rule = compiled(json!({ "required": true }));
        assert!(!rule.satisfies(None));
        assert!(!rule.satisfies(Some(&json!("   "))));
        assert!(rule.satisfies(Some(&json!("Ada"))));
    }

    #[test]
    fn numeric_bounds_accept_numeric_strings() {
        let rule = compiled(json!({ "required": true, "min": 11, "max": 119 }));
        assert!(rule.satisfies(Some(&json!("42"))));
        assert!(!rule.satisfies(Some(&json!("10"))));
        assert!(!rule.satisfies(Some(&json!("abc"))));
        assert!(rule.satisfies(Some(&json!(119))));
    }

    #[test]
    fn list_accepts_empty_array_but_not_absence() {
        let rule = compiled(json!({ "list": true }));
        assert!(rule.satisfies(Some(&json!([]))));
        assert!(!rule.satisfies(None));
        assert!(!rule.satisfies(Some(&json!("dr_none"))));
    }

    #[test]
    fn email_pattern() {
        let rule = compiled(json!({ "pattern": "^[^\\s@]+@[^\\s@]+\\.[^\\s@]+$" }));
        assert!(rule.satisfies(Some(&json!("ada@example.com"))));
        assert!(!rule.satisfies(Some(&json!("ada@example"))));
        assert!(!rule.satisfies(None));
    }

    #[test]
    fn empty_constraint_always_passes() {
        let rule = compiled(json!({}));
        assert!(rule.satisfies(None));
        assert!(rule.satisfies(Some(&json!("anything"))));
    }
}
