use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::expr::Expr;

/// Identifier of a step inside a catalog.
pub type StepId = String;

/// Closed set of step kinds a catalog may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    Welcome,
    Text,
    Email,
    IconSelect,
    #[serde(alias = "yes-no-circle")]
    YesNo,
    SingleButton,
    MultiGrid,
    Checkbox,
    Info,
    Loading,
    Results,
    #[serde(alias = "section-header")]
    SectionMarker,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Welcome => "welcome",
            StepType::Text => "text",
            StepType::Email => "email",
            StepType::IconSelect => "icon-select",
            StepType::YesNo => "yes-no",
            StepType::SingleButton => "single-button",
            StepType::MultiGrid => "multi-grid",
            StepType::Checkbox => "checkbox",
            StepType::Info => "info",
            StepType::Loading => "loading",
            StepType::Results => "results",
            StepType::SectionMarker => "section-marker",
        }
    }

    /// Choice steps that store a single option id.
    pub fn is_single_select(&self) -> bool {
        matches!(
            self,
            StepType::IconSelect | StepType::YesNo | StepType::SingleButton
        )
    }

    /// Choice steps that store a list of option ids.
    pub fn is_multi_select(&self) -> bool {
        matches!(self, StepType::MultiGrid | StepType::Checkbox)
    }

    pub fn is_choice(&self) -> bool {
        self.is_single_select() || self.is_multi_select()
    }

    pub fn is_text_input(&self) -> bool {
        matches!(self, StepType::Text | StepType::Email)
    }

    /// Whether the step occupies a slot on the progress bar.
    pub fn counts_toward_progress(&self) -> bool {
        !matches!(
            self,
            StepType::Welcome
                | StepType::Loading
                | StepType::Results
                | StepType::Info
                | StepType::SectionMarker
        )
    }

    /// Steps that never show the progress bar or a section as active.
    pub fn is_chrome_free(&self) -> bool {
        matches!(
            self,
            StepType::Welcome | StepType::Loading | StepType::Results | StepType::SectionMarker
        )
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option of a choice step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OptionSpec {
    pub id: String,
    #[serde(alias = "text")]
    pub label: String,
    /// Selecting this option clears every other selection of the field.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclusive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Declarative validation rule applied to a step's own answer value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Non-empty trimmed string, non-empty list, or any boolean.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Value must be a list (an empty list is accepted).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

impl Constraint {
    pub fn is_empty(&self) -> bool {
        self == &Constraint::default()
    }
}

/// Immutable definition of a single survey step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    pub id: StepId,
    #[serde(rename = "type")]
    pub kind: StepType,
    #[serde(default, alias = "sectionId", skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_key: Option<String>,
    #[serde(
        default,
        alias = "consentInputKey",
        skip_serializing_if = "Option::is_none"
    )]
    pub consent_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Expr>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_advance: bool,
    #[serde(
        default,
        alias = "autoAdvanceDelay",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_advance_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, alias = "text", skip_serializing_if = "Option::is_none")]
    pub sub_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(
        default,
        alias = "nextButtonText",
        skip_serializing_if = "Option::is_none"
    )]
    pub button_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_columns: Option<u8>,
}

impl StepSpec {
    /// Bare step of the given kind; handy for building catalogs in code.
    pub fn new(id: impl Into<StepId>, kind: StepType) -> Self {
        Self {
            id: id.into(),
            kind,
            section: None,
            input_key: None,
            consent_key: None,
            validation: None,
            validation_message: None,
            condition: None,
            auto_advance: false,
            auto_advance_delay_ms: None,
            options: Vec::new(),
            title: None,
            question: None,
            sub_text: None,
            placeholder: None,
            button_text: None,
            consent_text: None,
            input_type: None,
            grid_columns: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_input_key(mut self, key: impl Into<String>) -> Self {
        self.input_key = Some(key.into());
        self
    }

    pub fn with_consent_key(mut self, key: impl Into<String>) -> Self {
        self.consent_key = Some(key.into());
        self
    }

    pub fn with_validation(mut self, constraint: Constraint, message: impl Into<String>) -> Self {
        self.validation = Some(constraint);
        self.validation_message = Some(message.into());
        self
    }

    pub fn with_condition(mut self, condition: Expr) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_options(mut self, options: Vec<OptionSpec>) -> Self {
        self.options = options;
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    pub fn auto_advancing(mut self) -> Self {
        self.auto_advance = true;
        self
    }

    pub fn option(&self, option_id: &str) -> Option<&OptionSpec> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Ids of every option flagged as exclusive.
    pub fn exclusive_option_ids(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|option| option.exclusive)
            .map(|option| option.id.as_str())
            .collect()
    }

    pub fn is_section_marker(&self) -> bool {
        self.kind == StepType::SectionMarker
    }
}

impl OptionSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            exclusive: false,
            icon: None,
        }
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }
}
