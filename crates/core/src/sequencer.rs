//! Step sequencer: the state machine that walks a user through the form.
//!
//! The sequencer owns the current step index, the accumulated answers, the
//! continue gate and the in-flight submission flag. All state lives behind
//! one mutex that is never held across an await point, so a sequencer can
//! be shared (`Arc<Sequencer<..>>`) between the task reading user input and
//! the task reporting media events. The only suspend point is the
//! submission call made from the step just before completion.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;

use crate::answers::Answers;
use crate::gate::ContinueGate;
use crate::progress::{PersistedProgress, ProgressStore};
use crate::render::{render, StepView};
use crate::steps::{StepDescriptor, StepKind, StepRegistry};
use crate::submission::{SubmissionAck, SubmissionClient, SubmissionError};
use crate::types::SessionId;
use crate::validation::{self, FieldError};

// ---------------------------------------------------------------------------
// Public state types
// ---------------------------------------------------------------------------

/// Observable snapshot of the sequencer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequencerState {
    pub step_index: usize,
    pub answers: Answers,
    pub can_advance: bool,
    pub submitting: bool,
}

/// Last reported video state. Informational only: it drives neither the
/// gate nor persistence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaState {
    /// Playback position of the current step's video, reset on every step.
    pub position_secs: f64,
    /// Sticky once the user unmuted; later videos start with sound.
    pub unmuted: bool,
}

/// User input for the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Choice { option_id: String },
    Text { value: String },
    Contact { values: BTreeMap<String, String> },
}

impl StepInput {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Choice { .. } => "choice",
            Self::Text { .. } => "text",
            Self::Contact { .. } => "contact",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// Input failed its step's check; nothing was merged.
    #[error(transparent)]
    Validation(#[from] FieldError),

    /// The storage endpoint did not acknowledge the submission. The step
    /// index is unchanged and the answers are kept for a retry.
    #[error("Submission failed, please try again ({0})")]
    SubmissionTransport(#[from] SubmissionError),

    #[error("Please wait for the video before continuing")]
    GateClosed,

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("The form is already complete")]
    Completed,

    #[error("Step '{step}' is a {kind} step and does not accept {input} input")]
    InputMismatch {
        step: String,
        kind: &'static str,
        input: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Inner {
    step_index: usize,
    answers: Answers,
    submitting: bool,
    media: MediaState,
}

/// Clears the in-flight flag even if the submitting future is dropped.
struct SubmittingGuard<'a> {
    inner: &'a Mutex<Inner>,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        lock(self.inner).submitting = false;
    }
}

pub struct Sequencer<P, C> {
    registry: Arc<StepRegistry>,
    session_id: SessionId,
    store: P,
    client: C,
    gate: ContinueGate,
    inner: Mutex<Inner>,
}

impl<P, C> Sequencer<P, C>
where
    P: ProgressStore,
    C: SubmissionClient,
{
    /// Create a sequencer, hydrating from the progress store when it holds
    /// a usable snapshot, and arm the gate for the starting step.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn initialize(
        registry: Arc<StepRegistry>,
        session_id: SessionId,
        store: P,
        client: C,
        gate_delay: Duration,
    ) -> Self {
        let inner = match store.load() {
            Some(saved) if saved.step_index < registry.len() => {
                tracing::info!(
                    session_id = %session_id,
                    step_index = saved.step_index,
                    answers = saved.answers.len(),
                    "Restored saved form progress"
                );
                Inner {
                    step_index: saved.step_index,
                    answers: saved.answers,
                    ..Inner::default()
                }
            }
            Some(saved) => {
                tracing::warn!(
                    step_index = saved.step_index,
                    steps = registry.len(),
                    "Saved progress points past the last step; starting over"
                );
                Inner::default()
            }
            None => Inner::default(),
        };

        let sequencer = Self {
            registry,
            session_id,
            store,
            client,
            gate: ContinueGate::new(gate_delay),
            inner: Mutex::new(inner),
        };
        {
            let inner = lock(&sequencer.inner);
            sequencer.on_enter_step(&inner);
        }
        sequencer
    }

    pub fn state(&self) -> SequencerState {
        let inner = lock(&self.inner);
        SequencerState {
            step_index: inner.step_index,
            answers: inner.answers.clone(),
            can_advance: self.gate.is_open(),
            submitting: inner.submitting,
        }
    }

    pub fn step_index(&self) -> usize {
        lock(&self.inner).step_index
    }

    pub fn is_complete(&self) -> bool {
        self.step_index() == self.registry.completion_index()
    }

    pub fn can_advance(&self) -> bool {
        self.gate.is_open()
    }

    pub fn media(&self) -> MediaState {
        lock(&self.inner).media
    }

    /// Stateless projection of the current state for the UI layer.
    pub fn view(&self) -> StepView {
        render(&self.registry, &self.state())
    }

    /// Resolve once the continue gate for the current step is open.
    pub async fn wait_for_gate(&self) {
        self.gate.wait_open().await;
    }

    /// Record the video playback position for the current step.
    pub fn report_time_update(&self, position_secs: f64) {
        lock(&self.inner).media.position_secs = position_secs.max(0.0);
    }

    /// Record that the user unmuted the video.
    pub fn signal_unmute(&self) {
        lock(&self.inner).media.unmuted = true;
    }

    /// Continue past an `Info` step once the gate is open.
    ///
    /// Continuing from the step right before completion submits the answers
    /// collected so far, exactly as an answer on that step would.
    pub async fn advance(&self) -> Result<usize, SequencerError> {
        let pending = {
            let mut inner = lock(&self.inner);
            self.ensure_ready(&inner)?;
            let step = &self.registry.steps()[inner.step_index];
            if !matches!(step.kind, StepKind::Info) {
                return Err(SequencerError::InputMismatch {
                    step: step.id.clone(),
                    kind: step.kind.as_str(),
                    input: "continue",
                });
            }
            self.begin_submission(&mut inner)
        };
        self.finish_step(pending).await
    }

    /// Validate and merge the answer for the current step, then advance.
    ///
    /// On the step right before completion the merged answers are sent to
    /// the submission client first; a failed submission leaves the index
    /// unchanged (the merged answers stay merged) and can be retried by
    /// submitting again.
    pub async fn submit_answer(&self, input: StepInput) -> Result<usize, SequencerError> {
        let pending = {
            let mut inner = lock(&self.inner);
            self.ensure_ready(&inner)?;
            let step = &self.registry.steps()[inner.step_index];
            let patch = resolve_input(step, input)?;
            inner.answers.merge(patch);
            self.persist(&inner);
            self.begin_submission(&mut inner)
        };
        self.finish_step(pending).await
    }

    // -- internals ----------------------------------------------------------

    fn ensure_ready(&self, inner: &Inner) -> Result<(), SequencerError> {
        if inner.submitting {
            return Err(SequencerError::SubmissionInFlight);
        }
        if inner.step_index >= self.registry.completion_index() {
            return Err(SequencerError::Completed);
        }
        if !self.gate.is_open() {
            return Err(SequencerError::GateClosed);
        }
        Ok(())
    }

    /// If the current step is the submission step, mark the submission as
    /// in flight and return the answers to send.
    fn begin_submission(&self, inner: &mut Inner) -> Option<Answers> {
        if self.registry.submission_index() == Some(inner.step_index) {
            inner.submitting = true;
            Some(inner.answers.clone())
        } else {
            None
        }
    }

    async fn finish_step(&self, pending: Option<Answers>) -> Result<usize, SequencerError> {
        let Some(answers) = pending else {
            let mut inner = lock(&self.inner);
            return Ok(self.step_forward(&mut inner));
        };

        let guard = SubmittingGuard { inner: &self.inner };
        let outcome = match self.submit(&answers).await {
            Ok(ack) => {
                tracing::info!(
                    session_id = %self.session_id,
                    submission_id = %ack.id,
                    "Form answers submitted"
                );
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %e, "Failed to clear saved progress after submission");
                }
                let mut inner = lock(&self.inner);
                Ok(self.step_forward(&mut inner))
            }
            Err(e) => Err(e),
        };
        // Index has moved before the flag drops, so no second submission can start.
        drop(guard);
        outcome
    }

    async fn submit(&self, answers: &Answers) -> Result<SubmissionAck, SequencerError> {
        self.client
            .submit(answers, &self.session_id)
            .await
            .map_err(|e| {
                tracing::error!(session_id = %self.session_id, error = %e, "Form submission failed");
                SequencerError::SubmissionTransport(e)
            })
    }

    /// Move to the next step, clamped at completion, and re-arm the gate.
    fn step_forward(&self, inner: &mut Inner) -> usize {
        let from = inner.step_index;
        inner.step_index = (from + 1).min(self.registry.completion_index());
        inner.media.position_secs = 0.0;
        tracing::info!(
            session_id = %self.session_id,
            from_step = from,
            to_step = inner.step_index,
            "Form advanced"
        );
        self.on_enter_step(inner);
        inner.step_index
    }

    fn on_enter_step(&self, inner: &Inner) {
        self.gate.rearm();
        if inner.step_index < self.registry.completion_index() {
            self.persist(inner);
        }
    }

    fn persist(&self, inner: &Inner) {
        let snapshot = PersistedProgress {
            step_index: inner.step_index,
            answers: inner.answers.clone(),
        };
        if let Err(e) = self.store.save(&snapshot) {
            tracing::warn!(error = %e, "Failed to save form progress");
        }
    }
}

/// Check `input` against the step and turn it into answer pairs.
fn resolve_input(
    step: &StepDescriptor,
    input: StepInput,
) -> Result<Vec<(String, String)>, SequencerError> {
    match (&step.kind, input) {
        (StepKind::Choice { options, field_name }, StepInput::Choice { option_id }) => {
            validation::validate_choice(field_name, options, &option_id)?;
            Ok(vec![(field_name.clone(), option_id)])
        }
        (StepKind::TextInput { field_name, .. }, StepInput::Text { value }) => {
            let value = validation::validate_text(field_name, &value)?;
            Ok(vec![(field_name.clone(), value)])
        }
        (StepKind::ContactForm { fields }, StepInput::Contact { values }) => {
            Ok(validation::validate_contact_form(fields, &values)?)
        }
        (kind, input) => Err(SequencerError::InputMismatch {
            step: step.id.clone(),
            kind: kind.as_str(),
            input: input.as_str(),
        }),
    }
}

fn lock(mutex: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
