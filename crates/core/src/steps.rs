//! Step descriptors and the ordered step registry.
//!
//! A form is an ordered sequence of [`StepDescriptor`]s loaded once at
//! startup. The registry checks the structural invariants the sequencer
//! relies on (a single trailing `Completion` step, globally unique field
//! names) so that a malformed definition fails at load time rather than
//! halfway through a user's run.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

/// One step of the form: a video plus the interaction shown beside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescriptor {
    pub id: String,
    /// Reference to the video played for this step.
    pub media_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(flatten)]
    pub kind: StepKind,
}

/// The interaction a step asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StepKind {
    /// Video only; the user continues once the gate opens.
    Info,
    /// Pick one option; picking both answers and advances.
    Choice {
        options: Vec<ChoiceOption>,
        field_name: String,
    },
    /// Free text, single or multi line.
    TextInput {
        field_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
        #[serde(default)]
        multiline: bool,
    },
    /// Several contact fields submitted together.
    ContactForm { fields: Vec<ContactField> },
    /// Terminal screen.
    Completion {
        title: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_booking_ref: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// Input kind of a contact field, which selects its format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Email,
    #[serde(alias = "tel")]
    Phone,
}

impl StepKind {
    /// Short machine name, matching the serialized `type` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Choice { .. } => "choice",
            Self::TextInput { .. } => "text_input",
            Self::ContactForm { .. } => "contact_form",
            Self::Completion { .. } => "completion",
        }
    }
}

impl StepDescriptor {
    /// Answer field names this step writes into the accumulator.
    pub fn field_names(&self) -> Vec<&str> {
        match &self.kind {
            StepKind::Choice { field_name, .. } | StepKind::TextInput { field_name, .. } => {
                vec![field_name.as_str()]
            }
            StepKind::ContactForm { fields } => fields.iter().map(|f| f.name.as_str()).collect(),
            StepKind::Info | StepKind::Completion { .. } => Vec::new(),
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self.kind, StepKind::Completion { .. })
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Structural problems found while loading a step sequence.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Step sequence is empty")]
    Empty,

    #[error("Duplicate step id '{0}'")]
    DuplicateStepId(String),

    #[error("Step sequence must end with exactly one completion step")]
    CompletionPlacement,

    #[error("Field name '{field}' is used by more than one step (again in step '{step}')")]
    DuplicateFieldName { field: String, step: String },

    #[error("Step '{0}' is invalid: {1}")]
    InvalidStep(String, String),

    #[error("Failed to parse step definitions: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read step definitions: {0}")]
    Io(#[from] std::io::Error),
}

/// The immutable, checked sequence of steps for one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepRegistry {
    steps: Vec<StepDescriptor>,
}

impl StepRegistry {
    /// Build a registry, enforcing the sequence invariants.
    pub fn new(steps: Vec<StepDescriptor>) -> Result<Self, RegistryError> {
        validate_sequence(&steps)?;
        Ok(Self { steps })
    }

    /// Parse a JSON array of step descriptors.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let steps: Vec<StepDescriptor> = serde_json::from_str(json)?;
        Self::new(steps)
    }

    /// Read and parse a JSON step definition file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Fill in a booking link on the completion step when it has none.
    pub fn with_default_booking_ref(mut self, url: Option<String>) -> Self {
        let Some(url) = url else {
            return self;
        };
        if let Some(StepDescriptor {
            kind: StepKind::Completion { external_booking_ref, .. },
            ..
        }) = self.steps.last_mut()
        {
            if external_booking_ref.is_none() {
                *external_booking_ref = Some(url);
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false` for a constructed registry; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    /// Index of the terminal completion step (`N-1`).
    pub fn completion_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// Index of the step whose answer triggers submission (`N-2`), if the
    /// sequence has any step before completion.
    pub fn submission_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(2)
    }
}

fn validate_sequence(steps: &[StepDescriptor]) -> Result<(), RegistryError> {
    let Some(last) = steps.last() else {
        return Err(RegistryError::Empty);
    };
    if !last.is_completion() || steps.iter().filter(|s| s.is_completion()).count() != 1 {
        return Err(RegistryError::CompletionPlacement);
    }

    let mut step_ids = HashSet::new();
    let mut field_names = HashSet::new();
    for step in steps {
        if !step_ids.insert(step.id.as_str()) {
            return Err(RegistryError::DuplicateStepId(step.id.clone()));
        }
        validate_step(step)?;
        for field in step.field_names() {
            if !field_names.insert(field) {
                return Err(RegistryError::DuplicateFieldName {
                    field: field.to_string(),
                    step: step.id.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_step(step: &StepDescriptor) -> Result<(), RegistryError> {
    let invalid = |msg: &str| Err(RegistryError::InvalidStep(step.id.clone(), msg.to_string()));

    match &step.kind {
        StepKind::Choice { options, field_name } => {
            if field_name.trim().is_empty() {
                return invalid("choice step needs a field name");
            }
            if options.is_empty() {
                return invalid("choice step needs at least one option");
            }
            let mut seen = HashSet::new();
            if !options.iter().all(|o| seen.insert(o.id.as_str())) {
                return invalid("choice option ids must be unique");
            }
        }
        StepKind::TextInput { field_name, .. } => {
            if field_name.trim().is_empty() {
                return invalid("text input step needs a field name");
            }
        }
        StepKind::ContactForm { fields } => {
            if fields.is_empty() {
                return invalid("contact form needs at least one field");
            }
            if fields.iter().any(|f| f.name.trim().is_empty()) {
                return invalid("contact form fields need names");
            }
        }
        StepKind::Info | StepKind::Completion { .. } => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn info(id: &str) -> StepDescriptor {
        StepDescriptor {
            id: id.to_string(),
            media_ref: format!("/videos/{id}.mp4"),
            question: None,
            kind: StepKind::Info,
        }
    }

    pub fn choice(id: &str, field: &str, options: &[&str]) -> StepDescriptor {
        StepDescriptor {
            id: id.to_string(),
            media_ref: format!("/videos/{id}.mp4"),
            question: Some(format!("Question {id}?")),
            kind: StepKind::Choice {
                options: options
                    .iter()
                    .map(|o| ChoiceOption {
                        id: o.to_string(),
                        label: o.to_uppercase(),
                    })
                    .collect(),
                field_name: field.to_string(),
            },
        }
    }

    pub fn text(id: &str, field: &str) -> StepDescriptor {
        StepDescriptor {
            id: id.to_string(),
            media_ref: format!("/videos/{id}.mp4"),
            question: Some("Tell us more".to_string()),
            kind: StepKind::TextInput {
                field_name: field.to_string(),
                placeholder: None,
                multiline: true,
            },
        }
    }

    pub fn contact(id: &str) -> StepDescriptor {
        let field = |name: &str, kind: FieldKind, required: bool| ContactField {
            name: name.to_string(),
            label: name.to_string(),
            kind,
            required,
            placeholder: None,
        };
        StepDescriptor {
            id: id.to_string(),
            media_ref: format!("/videos/{id}.mp4"),
            question: None,
            kind: StepKind::ContactForm {
                fields: vec![
                    field("name", FieldKind::Text, true),
                    field("email", FieldKind::Email, true),
                    field("phone", FieldKind::Phone, false),
                ],
            },
        }
    }

    pub fn completion(id: &str) -> StepDescriptor {
        StepDescriptor {
            id: id.to_string(),
            media_ref: format!("/videos/{id}.mp4"),
            question: None,
            kind: StepKind::Completion {
                title: "Merci".to_string(),
                message: "We will be in touch".to_string(),
                external_booking_ref: None,
            },
        }
    }
}
