mod wizard;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use survey_engine::{
    DocumentViewer, EngineConfig, FileViewer, HttpSubmitter, Navigator, Outcome, RenderPayload,
    RenderStatus, ResultsSubmitter, SubmitOutcome, build_render_payload, render_json_ui,
    run_pending, submit_results,
};
use survey_spec::{
    AnswerSet, CatalogReport, CatalogSpec, PredicateTable, StepType, TemplateEngine,
    check_catalog,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use wizard::{Verbosity, WizardCommand, WizardPresenter, parse_command};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const RESULTS_DIR_ENV: &str = "SURVEY_RESULTS_DIR";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based survey wizard",
    long_about = "Walks through a step catalog in the terminal, submits the answers and saves the returned results page"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run a survey interactively.
    Run(RunArgs),
    /// Check a catalog for structural problems.
    Check {
        /// Path to the step catalog JSON.
        #[arg(long, value_name = "CATALOG")]
        catalog: PathBuf,
    },
    /// Print the JSON schema of step catalogs.
    Schema,
}

#[derive(Args)]
struct RunArgs {
    /// Path to the step catalog JSON.
    #[arg(long, value_name = "CATALOG")]
    catalog: PathBuf,
    /// Optional JSON file containing initial answers.
    #[arg(long, value_name = "ANSWERS")]
    answers: Option<PathBuf>,
    /// Results endpoint (overrides SURVEY_RESULTS_ENDPOINT).
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,
    /// Directory for the results page (defaults to SURVEY_RESULTS_DIR or the current directory).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Show verbose output (status, position, debug logs).
    #[arg(long, alias = "debug")]
    verbose: bool,
    /// Also emit answer JSON when the survey ends.
    #[arg(long)]
    answers_json: bool,
    /// Render output mode for each step.
    #[arg(long, value_enum, default_value_t = RenderMode::Text)]
    format: RenderMode,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let verbose = matches!(&cli.command, Command::Run(args) if args.verbose);
    init_tracing(verbose);

    match cli.command {
        Command::Run(args) => run_survey(args).await,
        Command::Check { catalog } => run_check(&catalog),
        Command::Schema => run_schema(),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_check(catalog_path: &Path) -> CliResult<()> {
    let catalog = CatalogSpec::from_path(catalog_path)?;
    let report = check_catalog(&catalog);
    println!(
        "Catalog {}: {} ({} steps)",
        catalog.id,
        if report.is_valid() { "valid" } else { "invalid" },
        catalog.len()
    );
    describe_report(&report);

    if report.is_valid() {
        Ok(())
    } else {
        Err("catalog check failed".into())
    }
}

fn describe_report(report: &CatalogReport) {
    for (label, issues) in [("Errors", &report.errors), ("Warnings", &report.warnings)] {
        if issues.is_empty() {
            continue;
        }
        println!("{}:", label);
        for issue in issues {
            println!(
                "  [{}] {} - {}",
                issue.code,
                issue.step_id.as_deref().unwrap_or("<catalog>"),
                issue.message
            );
        }
    }
}

fn run_schema() -> CliResult<()> {
    let schema = schemars::schema_for!(CatalogSpec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn run_survey(args: RunArgs) -> CliResult<()> {
    let catalog = CatalogSpec::from_path(&args.catalog)?;
    let report = check_catalog(&catalog);
    if !report.is_valid() {
        describe_report(&report);
        return Err("catalog check failed".into());
    }

    let mut config = EngineConfig::from_env()?;
    if let Some(endpoint) = args.endpoint {
        config = config.with_endpoint(endpoint);
    }
    let submitter = HttpSubmitter::from_config(&config)?;
    let viewer = FileViewer::new(resolve_output_dir(args.out)?, &catalog.id);

    let answers = match &args.answers {
        Some(path) => load_answers(path)?,
        None => AnswerSet::new(),
    };
    let predicates = PredicateTable::from_catalog(&catalog);
    let mut navigator =
        Navigator::new(Arc::new(catalog), predicates, config.timings()).with_answers(answers);

    let templates = TemplateEngine::new();
    let mut presenter =
        WizardPresenter::new(Verbosity::from_verbose(args.verbose), args.answers_json);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let payload = build_render_payload(&navigator, &templates);
        presenter.show_header(&payload);
        presenter.show_step(&payload);
        print_render_output(args.format, &payload)?;

        if payload.status == RenderStatus::Complete {
            presenter.show_completion(navigator.answers());
            return Ok(());
        }
        if navigator.pending_timer().is_some() {
            run_pending(&mut navigator).await;
            continue;
        }

        let Some(step) = payload.step else {
            return Err("catalog has no steps".into());
        };
        if payload.status == RenderStatus::Transition {
            return Err(format!("survey cannot continue past step '{}'", step.id).into());
        }

        presenter.show_prompt(&step, payload.can_go_back);
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = input.next_line().await? else {
            return Err("survey aborted: input closed".into());
        };

        let command = match parse_command(&step, &line) {
            Ok(command) => command,
            Err(err) => {
                presenter.show_parse_error(&err);
                continue;
            }
        };
        debug!(?command, step = %step.id, "wizard command");

        let submits = step.kind == StepType::Email;
        let finished = match command {
            WizardCommand::Exit => return Err("survey aborted by user".into()),
            WizardCommand::Back => {
                navigator.retreat();
                false
            }
            WizardCommand::Next if submits => {
                submit(&mut navigator, &submitter, &viewer, &presenter).await
            }
            WizardCommand::Next => navigator.advance() == Outcome::Unchanged,
            WizardCommand::Answer(text) => match navigator.answer_current(text) {
                Ok(()) if submits => {
                    submit(&mut navigator, &submitter, &viewer, &presenter).await
                }
                Ok(()) => navigator.advance() == Outcome::Unchanged,
                Err(err) => {
                    presenter.show_message(&err.to_string());
                    false
                }
            },
            WizardCommand::Select(option_id) => {
                let auto_advance = navigator
                    .current_step()
                    .is_some_and(|step| step.auto_advance);
                match navigator.select_option(&option_id) {
                    Ok(()) if !auto_advance => navigator.advance() == Outcome::Unchanged,
                    Ok(()) => false,
                    Err(err) => {
                        presenter.show_message(&err.to_string());
                        false
                    }
                }
            }
            WizardCommand::Toggle(option_ids) => {
                for option_id in option_ids {
                    if let Err(err) = navigator.toggle_current(&option_id) {
                        presenter.show_message(&err.to_string());
                    }
                }
                false
            }
            WizardCommand::Consent(agreed) => {
                let consent_key = navigator
                    .current_step()
                    .and_then(|step| step.consent_key.clone());
                match consent_key {
                    Some(key) => navigator.set_answer(key, agreed),
                    None => presenter.show_message("This step has no terms to agree to."),
                }
                false
            }
        };

        if finished {
            presenter.show_completion(navigator.answers());
            return Ok(());
        }
    }
}

/// Submits from the email step. Returns `true` once the results page is saved.
async fn submit(
    navigator: &mut Navigator,
    submitter: &dyn ResultsSubmitter,
    viewer: &FileViewer,
    presenter: &WizardPresenter,
) -> bool {
    println!("Generating your results...");
    let viewer_surface: &dyn DocumentViewer = viewer;
    match submit_results(navigator, submitter, viewer_surface).await {
        SubmitOutcome::Displayed(_) => {
            presenter.show_results(&viewer.path());
            true
        }
        SubmitOutcome::NotDisplayed { message, .. } => {
            presenter.show_message(&message);
            false
        }
        SubmitOutcome::Failed { .. } | SubmitOutcome::NotStarted(_) => false,
    }
}

fn print_render_output(mode: RenderMode, payload: &RenderPayload) -> CliResult<()> {
    match mode {
        RenderMode::Text => Ok(()),
        RenderMode::Json => {
            let ui = render_json_ui(payload);
            println!("JSON UI:\n{}", serde_json::to_string_pretty(&ui)?);
            Ok(())
        }
    }
}

fn load_answers(path: &Path) -> CliResult<AnswerSet> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    if !value.is_object() {
        return Err(format!("answers file {} must contain a JSON object", path.display()).into());
    }
    Ok(AnswerSet::from_value(value))
}

fn resolve_output_dir(out: Option<PathBuf>) -> CliResult<PathBuf> {
    let candidate = match out {
        Some(path) => path,
        None => env::var_os(RESULTS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if candidate.as_os_str().is_empty() {
        return Err("output directory cannot be empty".into());
    }
    fs::create_dir_all(&candidate)?;
    Ok(candidate)
}
