use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accumulated user responses keyed by input key.
///
/// Keys are only ever added or overwritten; nothing removes them once set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    values: Map<String, Value>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an answer set from a JSON object; anything else yields an empty set.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Truthiness of a flag answer; missing keys read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => !text.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
            Some(Value::Number(num)) => num.as_f64().is_some_and(|value| value != 0.0),
            Some(Value::Null) | None => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last write wins.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Single-select: replaces any prior value with the option id.
    pub fn select(&mut self, key: impl Into<String>, option_id: impl Into<String>) {
        self.values
            .insert(key.into(), Value::String(option_id.into()));
    }

    /// Multi-select toggle honouring exclusive options.
    ///
    /// Exclusive options replace the whole selection (or clear it when already
    /// selected). Other options first evict every exclusive id, then toggle
    /// their own membership.
    pub fn toggle(&mut self, key: &str, option_id: &str, exclusive_ids: &[&str]) {
        let current = self.selection(key);
        let next: Vec<String> = if exclusive_ids.contains(&option_id) {
            if current.iter().any(|id| id == option_id) {
                Vec::new()
            } else {
                vec![option_id.to_string()]
            }
        } else {
            let mut selection: Vec<String> = current
                .into_iter()
                .filter(|id| !exclusive_ids.contains(&id.as_str()))
                .collect();
            if let Some(index) = selection.iter().position(|id| id == option_id) {
                selection.remove(index);
            } else {
                selection.push(option_id.to_string());
            }
            selection
        };
        self.values.insert(
            key.to_string(),
            Value::Array(next.into_iter().map(Value::String).collect()),
        );
    }

    /// Current multi-select ids for a key; non-list values read as empty.
    pub fn selection(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_selected(&self, key: &str, option_id: &str) -> bool {
        match self.values.get(key) {
            Some(Value::String(text)) => text == option_id,
            Some(Value::Array(items)) => items.iter().any(|item| item.as_str() == Some(option_id)),
            _ => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.values)
    }
}
