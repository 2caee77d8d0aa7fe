//! Stateless projection of sequencer state into a UI description.
//!
//! The view carries everything a front end needs to draw the current step:
//! the video to play, the question, and the control for the step's type,
//! with its enabled flags already derived from the gate and the in-flight
//! submission.

use serde::Serialize;

use crate::sequencer::SequencerState;
use crate::steps::{ChoiceOption, ContactField, StepKind, StepRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub step_id: String,
    pub step_index: usize,
    pub total_steps: usize,
    pub media_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub control: Control,
}

/// The interactive control for one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Control {
    /// The continue button only appears once the gate opened.
    Continue { visible: bool, enabled: bool },
    Choice {
        options: Vec<ChoiceOption>,
        enabled: bool,
    },
    TextInput {
        placeholder: Option<String>,
        multiline: bool,
        enabled: bool,
    },
    ContactForm {
        fields: Vec<ContactField>,
        enabled: bool,
        submitting: bool,
    },
    Completion {
        title: String,
        message: String,
        booking_url: Option<String>,
    },
}

impl Control {
    /// Whether the control currently accepts user input.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Continue { visible, enabled } => *visible && *enabled,
            Self::Choice { enabled, .. }
            | Self::TextInput { enabled, .. }
            | Self::ContactForm { enabled, .. } => *enabled,
            Self::Completion { .. } => false,
        }
    }
}

/// Project `state` onto the step it points at.
///
/// An index outside the registry renders the completion step.
pub fn render(registry: &StepRegistry, state: &SequencerState) -> StepView {
    let index = state.step_index.min(registry.completion_index());
    let step = &registry.steps()[index];
    let enabled = state.can_advance && !state.submitting;

    let control = match &step.kind {
        StepKind::Info => Control::Continue {
            visible: state.can_advance,
            enabled,
        },
        StepKind::Choice { options, .. } => Control::Choice {
            options: options.clone(),
            enabled,
        },
        StepKind::TextInput {
            placeholder,
            multiline,
            ..
        } => Control::TextInput {
            placeholder: placeholder.clone(),
            multiline: *multiline,
            enabled,
        },
        StepKind::ContactForm { fields } => Control::ContactForm {
            fields: fields.clone(),
            enabled,
            submitting: state.submitting,
        },
        StepKind::Completion {
            title,
            message,
            external_booking_ref,
        } => Control::Completion {
            title: title.clone(),
            message: message.clone(),
            booking_url: external_booking_ref.clone(),
        },
    };

    StepView {
        step_id: step.id.clone(),
        step_index: index,
        total_steps: registry.len(),
        media_ref: step.media_ref.clone(),
        question: step.question.clone(),
        control,
    }
}
