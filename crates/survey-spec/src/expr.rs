use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::AnswerSet;

/// Lightweight expression AST used for step `condition`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    LiteralBool { value: bool },
    Eq { key: String, value: Value },
    NotEq { key: String, value: Value },
    Includes { key: String, value: Value },
    IsSet { key: String },
    And { expressions: Vec<Expr> },
    Or { expressions: Vec<Expr> },
    Not { expression: Box<Expr> },
}

impl Expr {
    pub fn equals(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn not_eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::NotEq {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn includes(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Includes {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Evaluates the expression against the answers collected so far.
    pub fn evaluate(&self, answers: &AnswerSet) -> bool {
        match self {
            Expr::LiteralBool { value } => *value,
            Expr::Eq { key, value } => answers.get(key) == Some(value),
            Expr::NotEq { key, value } => answers.get(key) != Some(value),
            Expr::Includes { key, value } => answers
                .get(key)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Expr::IsSet { key } => answers.get(key).is_some_and(|value| !value.is_null()),
            Expr::And { expressions } => expressions.iter().all(|expr| expr.evaluate(answers)),
            Expr::Or { expressions } => expressions.iter().any(|expr| expr.evaluate(answers)),
            Expr::Not { expression } => !expression.evaluate(answers),
        }
    }

    /// Every answer key the expression reads.
    pub fn referenced_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            Expr::LiteralBool { .. } => {}
            Expr::Eq { key, .. }
            | Expr::NotEq { key, .. }
            | Expr::Includes { key, .. }
            | Expr::IsSet { key } => keys.push(key.as_str()),
            Expr::And { expressions } | Expr::Or { expressions } => {
                for expr in expressions {
                    expr.collect_keys(keys);
                }
            }
            Expr::Not { expression } => expression.collect_keys(keys),
        }
    }
}
