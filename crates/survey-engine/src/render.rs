use serde_json::{Map, Value, json};
use survey_spec::{StepType, TemplateEngine};

use crate::navigator::Navigator;
use crate::traversal::Direction;

pub const DEFAULT_BUTTON_LABEL: &str = "Continue";
pub const SUBMITTING_BUTTON_LABEL: &str = "Generating...";

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The current step waits for the user.
    Active,
    /// A section header or loading screen is on display.
    Transition,
    /// Results are being generated.
    Submitting,
    /// The results step has been reached.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Active => "active",
            RenderStatus::Transition => "transition",
            RenderStatus::Submitting => "submitting",
            RenderStatus::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderProgress {
    pub current: usize,
    pub total: usize,
    pub visible: bool,
}

/// One entry of the section navigation strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSection {
    pub id: String,
    pub title: String,
    pub active: bool,
    pub viewed: bool,
}

/// Full-screen header shown while a section marker is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderHeader {
    pub label: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOption {
    pub id: String,
    pub label: String,
    pub selected: bool,
    pub exclusive: bool,
    pub icon: Option<String>,
}

/// Describes the current step for render outputs. Text fields are already
/// templated against the answers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStep {
    pub id: String,
    pub kind: StepType,
    pub title: Option<String>,
    pub question: Option<String>,
    pub sub_text: Option<String>,
    pub placeholder: Option<String>,
    pub input_key: Option<String>,
    pub current_value: Option<Value>,
    pub options: Vec<RenderOption>,
    pub consent_text: Option<String>,
    pub consent_checked: Option<bool>,
    pub button_label: String,
    pub shows_navigation: bool,
    pub shows_next: bool,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPayload {
    pub catalog_id: String,
    pub catalog_title: String,
    pub status: RenderStatus,
    pub position: usize,
    pub direction: Direction,
    pub step: Option<RenderStep>,
    pub header: Option<RenderHeader>,
    pub sections: Vec<RenderSection>,
    pub current_section: Option<String>,
    pub progress: RenderProgress,
    pub error: Option<String>,
    pub can_go_back: bool,
    pub next_disabled: bool,
}

/// Build the renderer payload from the navigator's current state.
pub fn build_render_payload(navigator: &Navigator, templates: &TemplateEngine) -> RenderPayload {
    let catalog = navigator.catalog();
    let answers = navigator.answers();
    let current_section = navigator.current_section().map(str::to_string);

    let sections = catalog
        .sections
        .iter()
        .map(|section| RenderSection {
            id: section.id.clone(),
            title: section.title.clone(),
            active: current_section.as_deref() == Some(section.id.as_str()),
            viewed: navigator.has_viewed(&section.id),
        })
        .collect::<Vec<_>>();

    let step = navigator.current_step();
    let header = step
        .filter(|step| step.is_section_marker())
        .and_then(|step| {
            let section_id = step.section.as_deref()?;
            let index = catalog.section_index(section_id)?;
            let title = catalog
                .section(section_id)
                .map(|section| section.title.clone())
                .unwrap_or_default();
            Some(RenderHeader {
                label: format!("Step {}", index + 1),
                title,
            })
        });

    let templated = |text: &Option<String>| {
        text.as_deref()
            .map(|text| templates.render_or_raw(text, answers))
    };

    let render_step = step.map(|step| {
        let current_value = step
            .input_key
            .as_deref()
            .and_then(|key| answers.get(key))
            .cloned();
        let options = step
            .options
            .iter()
            .map(|option| RenderOption {
                id: option.id.clone(),
                label: option.label.clone(),
                selected: step
                    .input_key
                    .as_deref()
                    .is_some_and(|key| answers.is_selected(key, &option.id)),
                exclusive: option.exclusive,
                icon: option.icon.clone(),
            })
            .collect();
        let button_label = if navigator.is_submitting() && step.kind == StepType::Email {
            SUBMITTING_BUTTON_LABEL.to_string()
        } else {
            step.button_text
                .clone()
                .unwrap_or_else(|| DEFAULT_BUTTON_LABEL.to_string())
        };
        let shows_navigation = !step.kind.is_chrome_free();

        RenderStep {
            id: step.id.clone(),
            kind: step.kind,
            title: templated(&step.title),
            question: templated(&step.question),
            sub_text: templated(&step.sub_text),
            placeholder: step.placeholder.clone(),
            input_key: step.input_key.clone(),
            current_value,
            options,
            consent_text: step.consent_text.clone(),
            consent_checked: step
                .consent_key
                .as_deref()
                .map(|key| answers.get_bool(key)),
            button_label,
            shows_navigation,
            shows_next: shows_navigation && !(step.kind.is_single_select() && step.auto_advance),
        }
    });

    let status = if navigator.is_submitting() {
        RenderStatus::Submitting
    } else {
        match step.map(|step| step.kind) {
            Some(StepType::Results) => RenderStatus::Complete,
            Some(StepType::SectionMarker | StepType::Loading) => RenderStatus::Transition,
            _ => RenderStatus::Active,
        }
    };

    let progress = navigator.progress();

    RenderPayload {
        catalog_id: catalog.id.clone(),
        catalog_title: catalog.title.clone(),
        status,
        position: navigator.position(),
        direction: navigator.direction(),
        step: render_step,
        header,
        sections,
        current_section,
        progress: RenderProgress {
            current: progress.current,
            total: progress.total,
            visible: progress.visible,
        },
        error: navigator.error().map(str::to_string),
        can_go_back: navigator.can_go_back(),
        next_disabled: navigator.next_disabled(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let step = payload.step.as_ref().map(|step| {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(step.id.clone()));
        map.insert("type".into(), Value::String(step.kind.as_str().to_string()));
        for (field, value) in [
            ("title", &step.title),
            ("question", &step.question),
            ("subText", &step.sub_text),
            ("placeholder", &step.placeholder),
            ("inputKey", &step.input_key),
            ("consentText", &step.consent_text),
        ] {
            if let Some(value) = value {
                map.insert(field.into(), Value::String(value.clone()));
            }
        }
        if let Some(current_value) = &step.current_value {
            map.insert("currentValue".into(), current_value.clone());
        }
        if let Some(checked) = step.consent_checked {
            map.insert("consentChecked".into(), Value::Bool(checked));
        }
        if !step.options.is_empty() {
            let options = step
                .options
                .iter()
                .map(|option| {
                    json!({
                        "id": option.id,
                        "label": option.label,
                        "selected": option.selected,
                        "exclusive": option.exclusive,
                        "icon": option.icon,
                    })
                })
                .collect();
            map.insert("options".into(), Value::Array(options));
        }
        map.insert("buttonLabel".into(), Value::String(step.button_label.clone()));
        map.insert("showsNavigation".into(), Value::Bool(step.shows_navigation));
        map.insert("showsNext".into(), Value::Bool(step.shows_next));
        Value::Object(map)
    });

    let sections = payload
        .sections
        .iter()
        .map(|section| {
            json!({
                "id": section.id,
                "title": section.title,
                "active": section.active,
                "viewed": section.viewed,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "catalogId": payload.catalog_id,
        "catalogTitle": payload.catalog_title,
        "status": payload.status.as_str(),
        "position": payload.position,
        "direction": payload.direction.as_str(),
        "step": step,
        "header": payload.header.as_ref().map(|header| json!({
            "label": header.label,
            "title": header.title,
        })),
        "sections": sections,
        "currentSection": payload.current_section,
        "progress": {
            "current": payload.progress.current,
            "total": payload.progress.total,
            "visible": payload.progress.visible,
        },
        "error": payload.error,
        "canGoBack": payload.can_go_back,
        "nextDisabled": payload.next_disabled,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();

    if !payload.sections.is_empty() && payload.progress.visible {
        let strip = payload
            .sections
            .iter()
            .map(|section| {
                if section.active {
                    format!("[{}]", section.title)
                } else if section.viewed {
                    format!("{} ✓", section.title)
                } else {
                    section.title.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(strip);
    }
    if payload.progress.visible && payload.progress.current > 0 {
        lines.push(format!(
            "Progress: {}/{}",
            payload.progress.current, payload.progress.total
        ));
    }

    if let Some(header) = &payload.header {
        lines.push(header.label.clone());
        lines.push(header.title.clone());
        return lines.join("\n");
    }

    let Some(step) = &payload.step else {
        lines.push(format!("{} has no steps.", payload.catalog_title));
        return lines.join("\n");
    };

    for text in [&step.title, &step.question, &step.sub_text]
        .into_iter()
        .flatten()
    {
        lines.push(text.clone());
    }

    for (index, option) in step.options.iter().enumerate() {
        let marker = match (step.kind.is_multi_select(), option.selected) {
            (true, true) => "[x]",
            (true, false) => "[ ]",
            (false, true) => "(*)",
            (false, false) => "( )",
        };
        lines.push(format!("  {} {}. {}", marker, index + 1, option.label));
    }

    if step.kind.is_text_input() {
        match &step.current_value {
            Some(value) => lines.push(format!("  Current value: {}", value_to_display(value))),
            None => {
                if let Some(placeholder) = &step.placeholder {
                    lines.push(format!("  ({placeholder})"));
                }
            }
        }
    }
    if let Some(consent) = &step.consent_text {
        let checked = if step.consent_checked == Some(true) {
            "[x]"
        } else {
            "[ ]"
        };
        lines.push(format!("  {checked} {consent}"));
    }

    if let Some(error) = &payload.error {
        lines.push(format!("! {error}"));
    }
    if step.shows_next || step.kind == StepType::Welcome {
        lines.push(format!("> {}", step.button_label));
    }

    lines.join("\n")
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(num) => num.to_string(),
        other => other.to_string(),
    }
}
