//! Survey navigator: owns the position, answers and transition rules.
//!
//! All state changes go through the navigator; renderers read it and send
//! events back (`advance`, `retreat`, answer mutations, `begin_submit`,
//! `fire`). Every committed position bumps the generation counter and drops
//! the pending timer, so a timer that outlives its step can never act.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use survey_spec::{
    AnswerSet, CatalogSpec, PredicateTable, ProgressPosition, StepCheck, StepSpec, StepType,
    current_section, progress_position, validate_step,
};
use tracing::{debug, error, info, warn};

use crate::error::{InputError, SubmitError, ViewerError};
use crate::timer::{Timer, TimerKind, Timings};
use crate::traversal::{Direction, find_next, find_stop};
use crate::viewer::Document;

/// Observable navigator state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NavigatorState {
    pub position: usize,
    pub direction: Direction,
    pub error: Option<String>,
    /// Sections whose header has been shown at least once.
    pub viewed_sections: BTreeSet<String>,
    pub submitting: bool,
    pub generation: u64,
}

/// Result of a navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Position changed; `to` is where the navigator came to rest.
    Moved { from: usize, to: usize },
    /// Validation failed; the message is now the current error.
    Blocked { message: String },
    /// Nothing to move to (start or end of the catalog).
    Unchanged,
    /// A submission is in flight.
    Busy,
}

/// Result of asking to submit from the current step.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStart {
    /// Submission is now in flight with this snapshot of the answers.
    Ready(AnswerSet),
    Blocked { message: String },
    Busy,
    /// The current step is not an `email` step.
    NotAvailable,
}

#[derive(Debug, Clone)]
pub struct Navigator {
    catalog: Arc<CatalogSpec>,
    predicates: PredicateTable,
    timings: Timings,
    answers: AnswerSet,
    state: NavigatorState,
    pending: Option<Timer>,
    next_timer_id: u64,
    last_document: Option<Document>,
}

impl Navigator {
    /// Starts a session at position 0; a marker there is handled immediately.
    pub fn new(catalog: Arc<CatalogSpec>, predicates: PredicateTable, timings: Timings) -> Self {
        let mut navigator = Self {
            catalog,
            predicates,
            timings,
            answers: AnswerSet::new(),
            state: NavigatorState::default(),
            pending: None,
            next_timer_id: 0,
            last_document: None,
        };
        navigator.arrive();
        navigator
    }

    /// Navigator with predicates compiled from the catalog and default timings.
    pub fn from_catalog(catalog: CatalogSpec) -> Self {
        let predicates = PredicateTable::from_catalog(&catalog);
        Self::new(Arc::new(catalog), predicates, Timings::default())
    }

    /// Seeds answers, e.g. from a saved answers file.
    pub fn with_answers(mut self, answers: AnswerSet) -> Self {
        self.answers = answers;
        self
    }

    pub fn catalog(&self) -> &CatalogSpec {
        &self.catalog
    }

    pub fn predicates(&self) -> &PredicateTable {
        &self.predicates
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn position(&self) -> usize {
        self.state.position
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state.submitting
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn has_viewed(&self, section_id: &str) -> bool {
        self.state.viewed_sections.contains(section_id)
    }

    pub fn current_step(&self) -> Option<&StepSpec> {
        self.catalog.step(self.state.position)
    }

    /// Timer the host should run next, if any.
    pub fn pending_timer(&self) -> Option<Timer> {
        self.pending
    }

    /// Last document returned by the results service, displayed or not.
    pub fn last_document(&self) -> Option<&Document> {
        self.last_document.as_ref()
    }

    /// Validation of the current step against the live answers.
    pub fn check_current(&self) -> StepCheck {
        match self.current_step() {
            Some(step) => validate_step(step, &self.predicates, &self.answers),
            None => StepCheck::Pass,
        }
    }

    /// Whether a back control makes sense: never from the first step, and
    /// never when going back would land on a welcome step.
    pub fn can_go_back(&self) -> bool {
        if self.state.position == 0 {
            return false;
        }
        self.find_next(self.state.position, Direction::Backward)
            .and_then(|index| self.catalog.step(index))
            .is_some_and(|step| step.kind != StepType::Welcome)
    }

    pub fn next_disabled(&self) -> bool {
        self.state.error.is_some() || self.state.submitting || !self.check_current().is_pass()
    }

    pub fn progress(&self) -> ProgressPosition {
        progress_position(&self.catalog, self.state.position)
    }

    pub fn current_section(&self) -> Option<&str> {
        current_section(&self.catalog, self.state.position)
    }

    /// Pure traversal over the live answers.
    pub fn find_next(&self, position: usize, direction: Direction) -> Option<usize> {
        find_next(
            &self.catalog,
            &self.predicates,
            &self.answers,
            position,
            direction,
        )
    }

    /// Forward navigation gated by validation of the current step.
    pub fn advance(&mut self) -> Outcome {
        if self.state.submitting {
            return Outcome::Busy;
        }
        if let StepCheck::Fail { message } = self.check_current() {
            debug!(position = self.state.position, %message, "advance blocked");
            self.state.error = Some(message.clone());
            return Outcome::Blocked { message };
        }

        self.state.error = None;
        let from = self.state.position;
        // Markers are only passed through on the way to a real step.
        let Some(target) = self.find_next(from, Direction::Forward) else {
            debug!(position = from, "end of catalog reached");
            return Outcome::Unchanged;
        };

        self.state.direction = Direction::Forward;
        let stop = self.find_stop(from, Direction::Forward).unwrap_or(target);
        self.commit(stop);
        Outcome::Moved {
            from,
            to: self.state.position,
        }
    }

    /// Backward navigation. A no-op at position 0; the first catalog entry is
    /// never a backward target once the user has left it.
    pub fn retreat(&mut self) -> Outcome {
        if self.state.submitting {
            return Outcome::Busy;
        }
        let from = self.state.position;
        if from == 0 {
            return Outcome::Unchanged;
        }

        self.state.direction = Direction::Backward;
        self.state.error = None;
        match self.find_next(from, Direction::Backward) {
            Some(target) if target > 0 => {
                let stop = self.find_stop(from, Direction::Backward).unwrap_or(target);
                self.commit(stop);
                Outcome::Moved {
                    from,
                    to: self.state.position,
                }
            }
            _ => Outcome::Unchanged,
        }
    }

    /// Free text, checkbox flags and consent: last write wins.
    pub fn set_answer(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.answers.set(key, value);
        self.state.error = None;
    }

    /// Stores the current step's answer under its input key.
    pub fn answer_current(&mut self, value: impl Into<Value>) -> Result<(), InputError> {
        let step = self.current_step().ok_or(InputError::NoCurrentStep)?;
        let key = step
            .input_key
            .clone()
            .ok_or_else(|| InputError::NoInputKey(step.id.clone()))?;
        self.set_answer(key, value);
        Ok(())
    }

    /// Single-select on the current step; schedules an advance when the step
    /// auto-advances.
    pub fn select_option(&mut self, option_id: &str) -> Result<(), InputError> {
        let step = self.current_step().ok_or(InputError::NoCurrentStep)?;
        if !step.kind.is_single_select() {
            return Err(InputError::NotAChoice(step.id.clone()));
        }
        let key = step
            .input_key
            .clone()
            .ok_or_else(|| InputError::NoInputKey(step.id.clone()))?;
        if step.option(option_id).is_none() {
            return Err(InputError::UnknownOption {
                step: step.id.clone(),
                option: option_id.to_string(),
            });
        }
        let auto_advance = step.auto_advance;

        self.answers.select(key, option_id);
        self.state.error = None;
        if auto_advance {
            self.schedule(TimerKind::AutoAdvance, self.timings.auto_advance);
        }
        Ok(())
    }

    /// Multi-select toggle on `key`, honouring the owning step's exclusive
    /// options.
    pub fn toggle_option(&mut self, key: &str, option_id: &str) -> Result<(), InputError> {
        let catalog = Arc::clone(&self.catalog);
        let step = catalog
            .step(self.state.position)
            .filter(|step| step.input_key.as_deref() == Some(key))
            .or_else(|| catalog.step_for_key(key))
            .ok_or_else(|| InputError::UnknownKey(key.to_string()))?;
        if !step.options.is_empty() && step.option(option_id).is_none() {
            return Err(InputError::UnknownOption {
                step: step.id.clone(),
                option: option_id.to_string(),
            });
        }

        self.answers
            .toggle(key, option_id, &step.exclusive_option_ids());
        self.state.error = None;
        Ok(())
    }

    /// Toggles an option of the current multi-select step.
    pub fn toggle_current(&mut self, option_id: &str) -> Result<(), InputError> {
        let step = self.current_step().ok_or(InputError::NoCurrentStep)?;
        if !step.kind.is_multi_select() {
            return Err(InputError::NotAChoice(step.id.clone()));
        }
        let key = step
            .input_key
            .clone()
            .ok_or_else(|| InputError::NoInputKey(step.id.clone()))?;
        self.toggle_option(&key, option_id)
    }

    /// Forward action of an `email` step: validates and marks the submission
    /// in flight.
    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.state.submitting {
            return SubmitStart::Busy;
        }
        if self.current_step().map(|step| step.kind) != Some(StepType::Email) {
            return SubmitStart::NotAvailable;
        }
        self.state.error = None;
        if let StepCheck::Fail { message } = self.check_current() {
            self.state.error = Some(message.clone());
            return SubmitStart::Blocked { message };
        }

        self.state.submitting = true;
        info!(answers = self.answers.len(), "submitting survey answers");
        SubmitStart::Ready(self.answers.clone())
    }

    /// Resolves the in-flight submission. Returns the document on success.
    pub fn finish_submit(&mut self, result: Result<Document, SubmitError>) -> Option<Document> {
        self.state.submitting = false;
        match result {
            Ok(document) => {
                info!(bytes = document.body.len(), "results document received");
                self.last_document = Some(document.clone());
                Some(document)
            }
            Err(err) => {
                error!(%err, "results submission failed");
                self.state.error = Some(err.user_message());
                None
            }
        }
    }

    /// The fetched document could not be shown; it stays in `last_document`.
    pub fn report_viewer_failure(&mut self, err: &ViewerError) {
        warn!(%err, "results document could not be displayed");
        self.state.error = Some(err.user_message().to_string());
    }

    /// Runs a timer previously returned by [`Navigator::pending_timer`].
    ///
    /// Returns `false` without touching state when the timer is stale (the
    /// position changed or another timer replaced it) or a submission is in
    /// flight.
    pub fn fire(&mut self, timer: Timer) -> bool {
        if timer.generation != self.state.generation || self.pending != Some(timer) {
            debug!(
                kind = timer.kind.as_str(),
                generation = timer.generation,
                "ignoring stale timer"
            );
            return false;
        }
        if self.state.submitting {
            return false;
        }
        self.pending = None;
        debug!(kind = timer.kind.as_str(), position = self.state.position, "timer fired");

        match timer.kind {
            TimerKind::SectionHeader => {
                if self.current_step().is_some_and(StepSpec::is_section_marker) {
                    self.skip_marker();
                }
            }
            TimerKind::Loading => match self.catalog.first_of(StepType::Results) {
                Some(results) => self.commit(results),
                None => error!(catalog = %self.catalog.id, "catalog has no results step"),
            },
            TimerKind::AutoAdvance => {
                self.advance();
            }
        }
        true
    }

    fn find_stop(&self, position: usize, direction: Direction) -> Option<usize> {
        find_stop(
            &self.catalog,
            &self.predicates,
            &self.answers,
            position,
            direction,
        )
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.next_timer_id += 1;
        self.pending = Some(Timer {
            id: self.next_timer_id,
            kind,
            generation: self.state.generation,
            delay,
        });
    }

    fn commit(&mut self, target: usize) {
        debug!(
            from = self.state.position,
            to = target,
            direction = self.state.direction.as_str(),
            "position committed"
        );
        self.state.position = target;
        self.state.generation += 1;
        self.pending = None;
        self.arrive();
    }

    fn arrive(&mut self) {
        let Some((kind, info_delay)) = self
            .current_step()
            .map(|step| (step.kind, step.auto_advance_delay_ms))
        else {
            return;
        };
        match kind {
            StepType::SectionMarker => self.arrive_at_marker(),
            StepType::Loading if !self.state.submitting => {
                self.schedule(TimerKind::Loading, self.timings.loading);
            }
            StepType::Info => {
                if let Some(delay) = info_delay {
                    self.schedule(TimerKind::AutoAdvance, Duration::from_millis(delay));
                }
            }
            _ => {}
        }
    }

    fn arrive_at_marker(&mut self) {
        let Some(step) = self.current_step() else {
            return;
        };
        let section = step.section.clone().unwrap_or_else(|| step.id.clone());
        let first_visit = self.state.viewed_sections.insert(section);

        if first_visit && self.state.direction == Direction::Forward {
            self.schedule(TimerKind::SectionHeader, self.timings.section_header);
        } else {
            self.skip_marker();
        }
    }

    fn skip_marker(&mut self) {
        let position = self.state.position;
        let direction = self.state.direction;

        // `advance` and `retreat` only move once a real step exists beyond
        // the marker, so this scan finds it or the next marker on the way.
        match self.find_stop(position, direction) {
            Some(target) => self.commit(target),
            None => warn!(position, "section marker has no step to continue to"),
        }
    }
}
