#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod navigator;
pub mod render;
pub mod submit;
pub mod timer;
pub mod traversal;
pub mod viewer;

pub use config::EngineConfig;
pub use error::{
    ConfigError, EngineError, InputError, SubmitError, VIEWER_BLOCKED_MESSAGE, ViewerError,
};
pub use navigator::{Navigator, NavigatorState, Outcome, SubmitStart};
pub use render::{
    RenderHeader, RenderOption, RenderPayload, RenderProgress, RenderSection, RenderStatus,
    RenderStep, build_render_payload, render_json_ui, render_text,
};
pub use submit::{HttpSubmitter, ResultsSubmitter, SubmitOutcome, submit_results};
pub use timer::{Timer, TimerKind, Timings, elapse, run_pending};
pub use traversal::{Direction, find_next};
pub use viewer::{Document, DocumentViewer, FileViewer};

/// Onboarding catalog bundled with the engine.
pub const DEFAULT_CATALOG: &str = include_str!("../../survey-spec/tests/fixtures/onboarding.json");
