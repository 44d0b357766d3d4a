use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use survey_engine::{
    DEFAULT_CATALOG, Direction, InputError, Navigator, Outcome, TimerKind, Timings, run_pending,
};
use survey_spec::{
    AnswerSet, CatalogSpec, Constraint, Expr, OptionSpec, PredicateTable, SectionSpec, StepSpec,
    StepType,
};

fn required() -> Constraint {
    Constraint {
        required: true,
        ..Constraint::default()
    }
}

fn navigator(steps: Vec<StepSpec>) -> Navigator {
    Navigator::from_catalog(CatalogSpec::new("test", steps))
}

fn onboarding() -> Navigator {
    let catalog = CatalogSpec::from_json_str(DEFAULT_CATALOG).expect("bundled catalog");
    let predicates = PredicateTable::from_catalog(&catalog);
    Navigator::new(Arc::new(catalog), predicates, Timings::immediate())
}

fn fire_pending(navigator: &mut Navigator) -> TimerKind {
    let timer = navigator.pending_timer().expect("timer scheduled");
    assert!(navigator.fire(timer));
    timer.kind
}

fn step_id(navigator: &Navigator) -> &str {
    navigator.current_step().map(|step| step.id.as_str()).unwrap_or("")
}

/// welcome, A (non-empty), B (only when A == "x"), C
fn conditional_catalog() -> Navigator {
    navigator(vec![
        StepSpec::new("welcome", StepType::Welcome),
        StepSpec::new("a", StepType::Text)
            .with_input_key("a")
            .with_validation(required(), "A is required."),
        StepSpec::new("b", StepType::Text)
            .with_input_key("b")
            .with_condition(Expr::equals("a", "x")),
        StepSpec::new("c", StepType::Text).with_input_key("c"),
    ])
}

#[test]
fn advance_follows_validation_and_conditions() {
    let mut nav = conditional_catalog();

    assert_eq!(nav.advance(), Outcome::Moved { from: 0, to: 1 });

    let outcome = nav.advance();
    assert_eq!(
        outcome,
        Outcome::Blocked {
            message: "A is required.".into()
        }
    );
    assert_eq!(nav.position(), 1);
    assert_eq!(nav.error(), Some("A is required."));

    nav.set_answer("a", "x");
    assert_eq!(nav.error(), None);
    assert_eq!(nav.advance(), Outcome::Moved { from: 1, to: 2 });

    let mut nav = conditional_catalog();
    nav.advance();
    nav.set_answer("a", "y");
    assert_eq!(nav.advance(), Outcome::Moved { from: 1, to: 3 });
    assert_eq!(step_id(&nav), "c");
    assert_eq!(nav.direction(), Direction::Forward);
}

#[test]
fn advance_at_end_leaves_position() {
    let mut nav = conditional_catalog();
    nav.advance();
    nav.set_answer("a", "y");
    nav.advance();
    assert_eq!(nav.advance(), Outcome::Unchanged);
    assert_eq!(nav.position(), 3);
}

#[test]
fn advance_stays_put_when_only_markers_remain() {
    let mut nav = navigator(vec![
        StepSpec::new("welcome", StepType::Welcome),
        StepSpec::new("a", StepType::Text).with_input_key("a"),
        StepSpec::new("m", StepType::SectionMarker).with_section("s1"),
        StepSpec::new("b", StepType::Text)
            .with_section("s1")
            .with_input_key("b")
            .with_condition(Expr::equals("a", "x")),
    ]);
    nav.advance();
    nav.set_answer("a", "y");

    assert_eq!(nav.advance(), Outcome::Unchanged);
    assert_eq!(step_id(&nav), "a");
    assert!(nav.pending_timer().is_none());
    assert!(!nav.has_viewed("s1"));

    nav.set_answer("a", "x");
    assert_eq!(nav.advance(), Outcome::Moved { from: 1, to: 2 });
    assert_eq!(fire_pending(&mut nav), TimerKind::SectionHeader);
    assert_eq!(step_id(&nav), "b");
}

#[test]
fn trailing_marker_is_never_entered() {
    let mut nav = navigator(vec![
        StepSpec::new("welcome", StepType::Welcome),
        StepSpec::new("a", StepType::Text).with_input_key("a"),
        StepSpec::new("m", StepType::SectionMarker).with_section("s1"),
    ]);
    nav.advance();
    assert_eq!(nav.advance(), Outcome::Unchanged);
    assert_eq!(nav.position(), 1);
    assert_eq!(
        nav.current_step().map(|step| step.kind),
        Some(StepType::Text)
    );
}

#[test]
fn retreat_at_start_is_idempotent() {
    let mut nav = conditional_catalog();
    let before = nav.state().clone();
    assert_eq!(nav.retreat(), Outcome::Unchanged);
    assert_eq!(nav.retreat(), Outcome::Unchanged);
    assert_eq!(nav.state(), &before);
}

#[test]
fn retreat_never_returns_to_welcome() {
    let mut nav = conditional_catalog();
    nav.advance();
    assert!(!nav.can_go_back());
    assert_eq!(nav.retreat(), Outcome::Unchanged);
    assert_eq!(nav.position(), 1);

    nav.set_answer("a", "y");
    nav.advance();
    assert!(nav.can_go_back());
    assert_eq!(nav.retreat(), Outcome::Moved { from: 3, to: 1 });
    assert_eq!(nav.direction(), Direction::Backward);
}

#[test]
fn retreat_clears_error() {
    let mut nav = navigator(vec![
        StepSpec::new("welcome", StepType::Welcome),
        StepSpec::new("first", StepType::Text).with_input_key("first"),
        StepSpec::new("second", StepType::Text)
            .with_input_key("second")
            .with_validation(required(), "Required."),
    ]);
    nav.advance();
    nav.advance();
    assert!(matches!(nav.advance(), Outcome::Blocked { .. }));
    assert!(nav.next_disabled());

    assert_eq!(nav.retreat(), Outcome::Moved { from: 2, to: 1 });
    assert_eq!(nav.error(), None);
}

#[test]
fn first_forward_visit_to_marker_waits_for_header() {
    let mut nav = navigator(vec![
        StepSpec::new("x", StepType::SectionMarker).with_section("s1"),
        StepSpec::new("y", StepType::Text).with_section("s1"),
    ]);

    assert_eq!(nav.position(), 0);
    assert!(nav.has_viewed("s1"));
    let timer = nav.pending_timer().expect("header timer");
    assert_eq!(timer.kind, TimerKind::SectionHeader);
    assert_eq!(timer.delay, Duration::from_millis(1800));

    assert_eq!(fire_pending(&mut nav), TimerKind::SectionHeader);
    assert_eq!(step_id(&nav), "y");
    assert!(nav.pending_timer().is_none());
}

#[test]
fn backward_arrival_at_seen_marker_skips_immediately() {
    let mut nav = navigator(vec![
        StepSpec::new("w", StepType::Welcome),
        StepSpec::new("a", StepType::Text).with_input_key("a"),
        StepSpec::new("x", StepType::SectionMarker).with_section("s1"),
        StepSpec::new("y", StepType::Text).with_section("s1"),
    ]);
    nav.advance();
    nav.advance();
    assert_eq!(step_id(&nav), "x");
    fire_pending(&mut nav);
    assert_eq!(step_id(&nav), "y");

    assert_eq!(nav.retreat(), Outcome::Moved { from: 3, to: 1 });
    assert!(nav.pending_timer().is_none());

    // Going forward again: header already seen, no delay.
    nav.advance();
    assert_eq!(step_id(&nav), "y");
    assert!(nav.pending_timer().is_none());
}

#[test]
fn backward_skip_over_adjacent_markers() {
    let mut nav = navigator(vec![
        StepSpec::new("w", StepType::Welcome),
        StepSpec::new("a", StepType::Text).with_input_key("a"),
        StepSpec::new("m1", StepType::SectionMarker).with_section("s1"),
        StepSpec::new("m2", StepType::SectionMarker).with_section("s2"),
        StepSpec::new("b", StepType::Text).with_section("s2"),
    ]);
    nav.advance();
    nav.advance();
    fire_pending(&mut nav);
    assert_eq!(step_id(&nav), "m2");
    fire_pending(&mut nav);
    assert_eq!(step_id(&nav), "b");

    nav.retreat();
    assert_eq!(step_id(&nav), "a");
}

#[test]
fn stale_timers_are_ignored() {
    let mut info = StepSpec::new("info", StepType::Info);
    info.auto_advance_delay_ms = Some(1500);
    let mut nav = navigator(vec![
        StepSpec::new("w", StepType::Welcome),
        StepSpec::new("a", StepType::Text).with_input_key("a"),
        info,
        StepSpec::new("b", StepType::Text).with_input_key("b"),
    ]);
    nav.advance();
    nav.advance();
    let timer = nav.pending_timer().expect("info auto-advance");
    assert_eq!(timer.kind, TimerKind::AutoAdvance);
    assert_eq!(timer.delay, Duration::from_millis(1500));

    nav.retreat();
    assert_eq!(step_id(&nav), "a");
    let generation = nav.generation();
    assert!(!nav.fire(timer));
    assert_eq!(step_id(&nav), "a");
    assert_eq!(nav.generation(), generation);
}

#[test]
fn reselecting_replaces_auto_advance_timer() {
    let mut nav = navigator(vec![
        StepSpec::new("w", StepType::Welcome),
        StepSpec::new("pick", StepType::YesNo)
            .with_input_key("pick")
            .with_options(vec![OptionSpec::new("yes", "Yes"), OptionSpec::new("no", "No")])
            .auto_advancing(),
        StepSpec::new("next", StepType::Text),
    ]);
    nav.advance();
    nav.select_option("yes").expect("select");
    let first = nav.pending_timer().expect("auto advance");
    nav.select_option("no").expect("select");
    let second = nav.pending_timer().expect("auto advance");
    assert_ne!(first, second);

    assert!(!nav.fire(first));
    assert_eq!(step_id(&nav), "pick");
    assert!(nav.fire(second));
    assert_eq!(step_id(&nav), "next");
    assert_eq!(nav.answers().get("pick"), Some(&json!("no")));
}

#[test]
fn select_rejects_unknown_options() {
    let mut nav = onboarding();
    assert_eq!(
        nav.select_option("yes"),
        Err(InputError::NotAChoice("welcome".into()))
    );

    nav.advance();
    nav.set_answer("userName", "Ada");
    nav.advance();
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "sex");
    assert_eq!(
        nav.select_option("other"),
        Err(InputError::UnknownOption {
            step: "sex".into(),
            option: "other".into()
        })
    );
}

fn run_guarded(nav: &mut Navigator) {
    for _ in 0..16 {
        let Some(timer) = nav.pending_timer() else {
            return;
        };
        nav.fire(timer);
    }
    panic!("timers did not settle");
}

#[test]
fn exclusive_options_never_mix() {
    let mut nav = onboarding();
    let key = "dietRestrictions";

    nav.toggle_option(key, "dr_dairy").expect("toggle");
    nav.toggle_option(key, "dr_gluten").expect("toggle");
    assert_eq!(nav.answers().selection(key), vec!["dr_dairy", "dr_gluten"]);

    nav.toggle_option(key, "dr_none").expect("toggle");
    assert_eq!(nav.answers().selection(key), vec!["dr_none"]);

    nav.toggle_option(key, "dr_paleo").expect("toggle");
    assert_eq!(nav.answers().selection(key), vec!["dr_paleo"]);

    nav.toggle_option(key, "dr_paleo").expect("toggle");
    assert!(nav.answers().selection(key).is_empty());

    nav.toggle_option(key, "dr_none").expect("toggle");
    nav.toggle_option(key, "dr_none").expect("toggle");
    assert!(nav.answers().selection(key).is_empty());

    assert_eq!(
        nav.toggle_option("nothing", "x"),
        Err(InputError::UnknownKey("nothing".into()))
    );
}

#[test]
fn conditions_follow_live_answers() {
    let mut nav = onboarding();
    let goals = nav.catalog().position_of("goals").expect("goals");
    let diet = nav.catalog().position_of("section-diet").expect("marker");

    nav.toggle_option("healthGoals", "g_heart").expect("toggle");
    assert_eq!(nav.find_next(goals, Direction::Forward), Some(diet + 1));

    nav.toggle_option("healthGoals", "g_energy").expect("toggle");
    let sluggish = nav.catalog().position_of("sluggish").expect("sluggish");
    assert_eq!(nav.find_next(goals, Direction::Forward), Some(sluggish));
}

#[test]
fn loading_step_moves_to_results() {
    let mut nav = navigator(vec![
        StepSpec::new("w", StepType::Welcome),
        StepSpec::new("loading", StepType::Loading),
        StepSpec::new("results", StepType::Results),
    ]);
    nav.advance();
    let timer = nav.pending_timer().expect("loading timer");
    assert_eq!(timer.kind, TimerKind::Loading);
    assert_eq!(timer.delay, Duration::from_millis(2000));
    nav.fire(timer);
    assert_eq!(step_id(&nav), "results");
}

#[test]
fn progress_and_sections_track_position() {
    let catalog = CatalogSpec::new(
        "progress",
        vec![
            StepSpec::new("w", StepType::Welcome),
            StepSpec::new("m", StepType::SectionMarker).with_section("s1"),
            StepSpec::new("a", StepType::Text).with_section("s1"),
            StepSpec::new("b", StepType::Text).with_section("s1"),
        ],
    )
    .with_sections(vec![SectionSpec {
        id: "s1".into(),
        title: "Basics".into(),
    }]);
    let mut nav = Navigator::from_catalog(catalog);
    assert!(!nav.progress().visible);
    assert_eq!(nav.current_section(), None);

    nav.advance();
    assert_eq!(nav.current_section(), Some("s1"));
    fire_pending(&mut nav);
    let progress = nav.progress();
    assert_eq!((progress.current, progress.total), (1, 2));
    assert!(progress.visible);
}

#[test]
fn walks_the_bundled_survey() {
    let mut nav = onboarding();
    nav.advance();
    assert_eq!(step_id(&nav), "name");
    assert!(matches!(nav.advance(), Outcome::Blocked { .. }));

    nav.answer_current("Ada").expect("answer");
    nav.advance();
    assert_eq!(step_id(&nav), "greeting");
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "sex");
    assert!(nav.has_viewed("basics"));

    nav.select_option("female").expect("select");
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "age");

    nav.answer_current("7").expect("answer");
    assert_eq!(
        nav.advance(),
        Outcome::Blocked {
            message: "Please enter a valid age.".into()
        }
    );
    nav.answer_current("34").expect("answer");
    nav.advance();
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "goals");

    nav.toggle_current("g_bones").expect("toggle");
    nav.advance();
    assert_eq!(step_id(&nav), "bone_history");
    nav.select_option("no").expect("select");
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "diet_describe");

    nav.select_option("d_vegan").expect("select");
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "diet_restrictions");

    nav.toggle_current("dr_none").expect("toggle");
    nav.advance();
    nav.toggle_current("al_none").expect("toggle");
    nav.advance();
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "exercise");

    nav.select_option("ex_2_3").expect("select");
    run_guarded(&mut nav);
    nav.select_option("no").expect("select");
    run_guarded(&mut nav);
    assert_eq!(step_id(&nav), "email");

    let answers: &AnswerSet = nav.answers();
    assert_eq!(answers.get("dietDescription"), Some(&json!("d_vegan")));
    assert!(!answers.contains("meatFrequency"));
    assert_eq!(
        nav.state().viewed_sections.len(),
        nav.catalog().sections.len()
    );
}

#[tokio::test(start_paused = true)]
async fn run_pending_waits_for_the_header() {
    let mut nav = navigator(vec![
        StepSpec::new("x", StepType::SectionMarker).with_section("s1"),
        StepSpec::new("y", StepType::Text).with_section("s1"),
    ]);
    let started = tokio::time::Instant::now();
    assert_eq!(run_pending(&mut nav).await, 1);
    assert!(started.elapsed() >= Duration::from_millis(1800));
    assert_eq!(step_id(&nav), "y");
}
