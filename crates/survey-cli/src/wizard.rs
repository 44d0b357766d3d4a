use std::path::Path;

use survey_engine::{RenderPayload, RenderStep, render_text};
use survey_spec::{AnswerSet, StepType};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: step text and prompts only.
    Clean,
    /// Verbose output: status, position, section and answer details.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints steps and prompts as the navigator moves.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload) {
        if self.header_printed {
            return;
        }
        println!("Survey: {}", payload.catalog_title);
        self.header_printed = true;
    }

    pub fn show_step(&self, payload: &RenderPayload) {
        if self.verbosity.is_verbose() {
            println!(
                "Status: {} (position {}, {})",
                payload.status.as_str(),
                payload.position,
                payload.direction.as_str()
            );
            if let Some(section) = &payload.current_section {
                println!("Section: {}", section);
            }
        }
        println!();
        println!("{}", render_text(payload));
    }

    pub fn show_prompt(&self, step: &RenderStep, can_go_back: bool) {
        let mut hints = Vec::new();
        if let Some(hint) = step_hint(step) {
            hints.push(hint);
        }
        if can_go_back {
            hints.push("'back' to go back".to_string());
        }
        hints.push("'exit' to quit".to_string());
        println!("({})", hints.join(", "));
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_message(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn show_results(&self, path: &Path) {
        println!("Your results are ready: {}", path.display());
    }

    pub fn show_completion(&self, answers: &AnswerSet) {
        println!("Done ✅");
        if self.show_answers_json {
            match answers.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

fn step_hint(step: &RenderStep) -> Option<String> {
    match step.kind {
        kind if kind.is_single_select() => {
            Some(format!("pick 1-{} or an option id", step.options.len()))
        }
        kind if kind.is_multi_select() => {
            Some("toggle with numbers or ids, comma separated; Enter to continue".to_string())
        }
        StepType::Email if step.consent_text.is_some() => {
            Some("type your email, 'agree' to accept the terms, Enter to submit".to_string())
        }
        StepType::Email => Some("type your email, Enter to submit".to_string()),
        StepType::Text => Some("type your answer".to_string()),
        StepType::Welcome | StepType::Info => Some("Enter to continue".to_string()),
        _ => None,
    }
}

/// One line of user input, interpreted against the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardCommand {
    Next,
    Back,
    Exit,
    Answer(String),
    Select(String),
    Toggle(Vec<String>),
    Consent(bool),
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

pub fn parse_command(step: &RenderStep, raw: &str) -> Result<WizardCommand, AnswerParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("next") {
        return Ok(WizardCommand::Next);
    }
    if trimmed.eq_ignore_ascii_case("back") {
        return Ok(WizardCommand::Back);
    }
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        return Ok(WizardCommand::Exit);
    }

    match step.kind {
        kind if kind.is_single_select() => resolve_option(step, trimmed).map(WizardCommand::Select),
        kind if kind.is_multi_select() => trimmed
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| resolve_option(step, part))
            .collect::<Result<Vec<_>, _>>()
            .map(WizardCommand::Toggle),
        StepType::Email | StepType::Text => {
            if step.consent_text.is_some() {
                if trimmed.eq_ignore_ascii_case("agree") {
                    return Ok(WizardCommand::Consent(true));
                }
                if trimmed.eq_ignore_ascii_case("disagree") {
                    return Ok(WizardCommand::Consent(false));
                }
            }
            Ok(WizardCommand::Answer(trimmed.to_string()))
        }
        _ => Ok(WizardCommand::Next),
    }
}

fn resolve_option(step: &RenderStep, raw: &str) -> Result<String, AnswerParseError> {
    if let Ok(index) = raw.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|index| step.options.get(index))
            .map(|option| option.id.clone())
            .ok_or_else(|| {
                AnswerParseError::new(
                    format!("choose a number between 1 and {}", step.options.len()),
                    Some(format!("got {}", index)),
                )
            });
    }
    step.options
        .iter()
        .find(|option| option.id == raw || option.label.eq_ignore_ascii_case(raw))
        .map(|option| option.id.clone())
        .ok_or_else(|| {
            let ids = step
                .options
                .iter()
                .map(|option| option.id.as_str())
                .collect::<Vec<_>>();
            AnswerParseError::new(
                format!("'{}' is not one of the options", raw),
                Some(format!("one of: {}", ids.join(", "))),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_engine::RenderOption;

    fn step(kind: StepType, options: &[(&str, &str)]) -> RenderStep {
        RenderStep {
            id: "step".into(),
            kind,
            title: None,
            question: Some("Question?".into()),
            sub_text: None,
            placeholder: None,
            input_key: Some("key".into()),
            current_value: None,
            options: options
                .iter()
                .map(|(id, label)| RenderOption {
                    id: id.to_string(),
                    label: label.to_string(),
                    selected: false,
                    exclusive: false,
                    icon: None,
                })
                .collect(),
            consent_text: None,
            consent_checked: None,
            button_label: "Continue".into(),
            shows_navigation: true,
            shows_next: true,
        }
    }

    #[test]
    fn navigation_words_are_recognised() {
        let step = step(StepType::Text, &[]);
        assert_eq!(parse_command(&step, "").unwrap(), WizardCommand::Next);
        assert_eq!(parse_command(&step, " BACK ").unwrap(), WizardCommand::Back);
        assert_eq!(parse_command(&step, "quit").unwrap(), WizardCommand::Exit);
        assert_eq!(
            parse_command(&step, "Ada").unwrap(),
            WizardCommand::Answer("Ada".into())
        );
    }

    #[test]
    fn single_select_accepts_number_id_or_label() {
        let step = step(StepType::YesNo, &[("yes", "Yes"), ("no", "No")]);
        assert_eq!(
            parse_command(&step, "2").unwrap(),
            WizardCommand::Select("no".into())
        );
        assert_eq!(
            parse_command(&step, "yes").unwrap(),
            WizardCommand::Select("yes".into())
        );
        assert_eq!(
            parse_command(&step, "No").unwrap(),
            WizardCommand::Select("no".into())
        );
        assert!(parse_command(&step, "3").is_err());
        assert!(parse_command(&step, "maybe").is_err());
    }

    #[test]
    fn multi_select_toggles_several() {
        let step = step(
            StepType::Checkbox,
            &[("dr_dairy", "Dairy"), ("dr_gluten", "Gluten"), ("dr_none", "None")],
        );
        assert_eq!(
            parse_command(&step, "1, dr_none").unwrap(),
            WizardCommand::Toggle(vec!["dr_dairy".into(), "dr_none".into()])
        );
        let err = parse_command(&step, "1,9").unwrap_err();
        assert!(err.user_message.contains("between 1 and 3"));
    }

    #[test]
    fn consent_words_only_on_consent_steps() {
        let mut email = step(StepType::Email, &[]);
        assert_eq!(
            parse_command(&email, "agree").unwrap(),
            WizardCommand::Answer("agree".into())
        );
        email.consent_text = Some("I agree to the privacy policy.".into());
        assert_eq!(
            parse_command(&email, "agree").unwrap(),
            WizardCommand::Consent(true)
        );
        assert_eq!(
            parse_command(&email, "ada@example.com").unwrap(),
            WizardCommand::Answer("ada@example.com".into())
        );
    }

    #[test]
    fn hints_follow_step_kind() {
        let select = step(StepType::IconSelect, &[("a", "A"), ("b", "B")]);
        assert_eq!(step_hint(&select).as_deref(), Some("pick 1-2 or an option id"));
        assert!(step_hint(&step(StepType::Results, &[])).is_none());
    }
}
