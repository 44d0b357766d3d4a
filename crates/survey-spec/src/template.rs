use handlebars::{Handlebars, handlebars_helper, no_escape};
use serde_json::Value;
use thiserror::Error;

use crate::answers::AnswerSet;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to render template '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

handlebars_helper!(default_value: |value: Json, fallback: Json| {
    match value {
        Value::Null => fallback.clone(),
        Value::String(text) if text.trim().is_empty() => fallback.clone(),
        other => other.clone(),
    }
});

handlebars_helper!(upper: |value: str| value.to_uppercase());

/// Registers the helpers available to step text (`default`, `upper`).
pub fn register_default_helpers(registry: &mut Handlebars<'_>) {
    registry.register_helper("default", Box::new(default_value));
    registry.register_helper("upper", Box::new(upper));
}

/// Renders step text such as `Nice to meet you, {{userName}}!` against answers.
#[derive(Debug)]
pub struct TemplateEngine {
    registry: Handlebars<'static>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(no_escape);
        register_default_helpers(&mut registry);
        Self { registry }
    }

    pub fn render(&self, template: &str, answers: &AnswerSet) -> Result<String, TemplateError> {
        if !template.contains("{{") {
            return Ok(template.to_string());
        }
        self.registry
            .render_template(template, answers.as_map())
            .map_err(|source| TemplateError::Render {
                template: template.to_string(),
                source: Box::new(source),
            })
    }

    /// Like [`TemplateEngine::render`], but falls back to the raw text.
    pub fn render_or_raw(&self, template: &str, answers: &AnswerSet) -> String {
        self.render(template, answers).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to raw step text");
            template.to_string()
        })
    }
}
