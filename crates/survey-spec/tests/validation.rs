use serde_json::{Value, json};

use survey_spec::{
    AnswerSet, CONSENT_MESSAGE, CatalogSpec, Constraint, PredicateTable, StepCheck, StepSpec,
    StepType, check_catalog, validate_step,
};

fn fixture(name: &str) -> &'static str {
    match name {
        "onboarding" => include_str!("../tests/fixtures/onboarding.json"),
        _ => panic!("unknown fixture {}", name),
    }
}

fn onboarding() -> CatalogSpec {
    CatalogSpec::from_json_str(fixture("onboarding")).expect("deserialize")
}

fn step<'a>(catalog: &'a CatalogSpec, id: &str) -> &'a StepSpec {
    catalog
        .steps
        .iter()
        .find(|step| step.id == id)
        .expect("step present")
}

#[test]
fn fixture_catalog_is_clean() {
    let report = check_catalog(&onboarding());
    assert!(report.is_valid(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn aliases_from_legacy_catalogs_are_accepted() {
    let catalog = onboarding();
    let email = step(&catalog, "email");
    assert_eq!(email.consent_key.as_deref(), Some("hasConsented"));
    assert_eq!(step(&catalog, "greeting").auto_advance_delay_ms, Some(1500));
    assert_eq!(step(&catalog, "name").button_text.as_deref(), Some("Next"));

    let legacy: StepSpec = serde_json::from_value(json!({
        "id": "section-basics",
        "type": "section-header",
        "sectionId": "basics"
    }))
    .expect("legacy marker");
    assert_eq!(legacy.kind, StepType::SectionMarker);

    let legacy: StepSpec = serde_json::from_value(json!({
        "id": "sex",
        "type": "yes-no-circle",
        "inputKey": "sex",
        "options": [{ "id": "male", "text": "Male" }]
    }))
    .expect("legacy yes/no");
    assert_eq!(legacy.kind, StepType::YesNo);
    assert_eq!(legacy.options[0].label, "Male");
}

#[test]
fn step_without_rules_always_passes() {
    let catalog = onboarding();
    let table = PredicateTable::from_catalog(&catalog);
    let check = validate_step(step(&catalog, "sex"), &table, &AnswerSet::new());
    assert_eq!(check, StepCheck::Pass);
}

#[test]
fn validation_message_comes_from_step() {
    let catalog = onboarding();
    let table = PredicateTable::from_catalog(&catalog);
    let check = validate_step(step(&catalog, "age"), &table, &AnswerSet::new());
    assert_eq!(check.message(), Some("Please enter a valid age."));

    let answers = AnswerSet::from_value(json!({ "age": "34" }));
    assert!(validate_step(step(&catalog, "age"), &table, &answers).is_pass());
}

#[test]
fn consent_gates_email_step() {
    let catalog = onboarding();
    let table = PredicateTable::from_catalog(&catalog);
    let email = step(&catalog, "email");

    let mut answers = AnswerSet::from_value(json!({ "email": "ada@example.com" }));
    assert_eq!(validate_step(email, &table, &answers).message(), Some(CONSENT_MESSAGE));

    answers.set("hasConsented", false);
    assert!(!validate_step(email, &table, &answers).is_pass());

    answers.set("hasConsented", true);
    assert!(validate_step(email, &table, &answers).is_pass());

    answers.set("email", "not-an-email");
    assert_eq!(
        validate_step(email, &table, &answers).message(),
        Some("Please enter a valid email address.")
    );
}

#[test]
fn registered_validator_overrides_declared_rule() {
    let catalog = onboarding();
    let table = PredicateTable::from_catalog(&catalog)
        .with_validator("name", |value: Option<&Value>| {
            value.and_then(Value::as_str) == Some("Ada")
        });
    let name = step(&catalog, "name");

    let answers = AnswerSet::from_value(json!({ "userName": "Grace" }));
    assert!(!validate_step(name, &table, &answers).is_pass());
    let answers = AnswerSet::from_value(json!({ "userName": "Ada" }));
    assert!(validate_step(name, &table, &answers).is_pass());
}

#[test]
fn check_catalog_reports_structural_problems() {
    let catalog = CatalogSpec::new(
        "broken",
        vec![
            StepSpec::new("q", StepType::SingleButton),
            StepSpec::new("q", StepType::Text).with_input_key("q"),
            StepSpec::new("marker", StepType::SectionMarker),
            StepSpec::new("mail", StepType::Email)
                .with_input_key("email")
                .with_validation(
                    Constraint {
                        pattern: Some("([".into()),
                        ..Constraint::default()
                    },
                    "bad",
                ),
            StepSpec::new("loading", StepType::Loading),
            StepSpec::new("tail", StepType::SectionMarker).with_section("nowhere"),
        ],
    );

    let report = check_catalog(&catalog);
    let codes: Vec<_> = report.errors.iter().map(|issue| issue.code).collect();
    assert!(!report.is_valid());
    for expected in [
        "duplicate_step",
        "missing_options",
        "missing_input_key",
        "marker_without_section",
        "invalid_pattern",
        "missing_results",
        "unknown_section",
    ] {
        assert!(codes.contains(&expected), "missing {expected} in {codes:?}");
    }
    assert!(
        report
            .warnings
            .iter()
            .any(|issue| issue.code == "trailing_marker")
    );
}

#[test]
fn empty_catalog_is_rejected() {
    let err = CatalogSpec::from_json_str(r#"{ "id": "x", "title": "x", "version": "1", "steps": [] }"#)
        .expect_err("empty catalog");
    assert!(err.to_string().contains("has no steps"));
}
