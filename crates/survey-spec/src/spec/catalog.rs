use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::step::{StepSpec, StepType};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog '{0}' has no steps")]
    Empty(String),
}

/// Named group of steps announced by a section marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionSpec {
    pub id: String,
    pub title: String,
}

/// Ordered, read-only step catalog for one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CatalogSpec {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionSpec>,
    pub steps: Vec<StepSpec>,
}

fn default_version() -> String {
    "0.0.0".into()
}

impl CatalogSpec {
    pub fn new(id: impl Into<String>, steps: Vec<StepSpec>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            version: default_version(),
            description: None,
            sections: Vec::new(),
            steps,
        }
    }

    pub fn with_sections(mut self, sections: Vec<SectionSpec>) -> Self {
        self.sections = sections;
        self
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog: CatalogSpec = serde_json::from_str(raw)?;
        if catalog.steps.is_empty() {
            return Err(CatalogError::Empty(catalog.id));
        }
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.steps.get(index)
    }

    pub fn position_of(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == step_id)
    }

    /// First step of the given kind, e.g. the `results` step.
    pub fn first_of(&self, kind: StepType) -> Option<usize> {
        self.steps.iter().position(|step| step.kind == kind)
    }

    pub fn section(&self, section_id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Zero-based index of a section in declaration order.
    pub fn section_index(&self, section_id: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.id == section_id)
    }

    /// Step that owns the given input key, preferring choice steps.
    pub fn step_for_key(&self, key: &str) -> Option<&StepSpec> {
        self.steps
            .iter()
            .filter(|step| step.input_key.as_deref() == Some(key))
            .max_by_key(|step| step.kind.is_choice())
    }
}
