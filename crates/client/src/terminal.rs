//! Line-oriented terminal driver for a [`Sequencer`].
//!
//! Each iteration renders the current step from the sequencer's view,
//! waits out the continue gate, reads the answer for the step's control and
//! hands it to the sequencer. Validation and submission failures are shown
//! inline and the same step is asked again.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use vidform_core::progress::ProgressStore;
use vidform_core::render::{Control, StepView};
use vidform_core::sequencer::{Sequencer, SequencerError, StepInput};
use vidform_core::steps::{ChoiceOption, ContactField};
use vidform_core::submission::SubmissionClient;
use vidform_core::types::SessionId;
use vidform_core::viewer::SubmissionListing;

/// File under the progress directory holding the current session id.
const SESSION_FILE: &str = "session-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The completion step was reached.
    Completed,
    /// Input ended before completion; progress stays saved.
    InputClosed { step_index: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

enum Action {
    Continue,
    Answer(StepInput),
}

pub struct Terminal<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Drive `sequencer` until completion or end of input.
    pub async fn run<P, C>(
        &mut self,
        sequencer: &Sequencer<P, C>,
    ) -> Result<RunOutcome, TerminalError>
    where
        P: ProgressStore,
        C: SubmissionClient,
    {
        loop {
            let view = sequencer.view();
            self.show_step(&view)?;

            if let Control::Completion {
                title,
                message,
                booking_url,
            } = &view.control
            {
                self.show_completion(title, message, booking_url.as_deref())?;
                return Ok(RunOutcome::Completed);
            }

            if !sequencer.can_advance() {
                writeln!(self.out, "  (playing video...)")?;
                sequencer.wait_for_gate().await;
            }

            let Some(action) = self.read_action(&view.control).await? else {
                return Ok(RunOutcome::InputClosed {
                    step_index: view.step_index,
                });
            };

            let result = match action {
                Action::Continue => sequencer.advance().await,
                Action::Answer(input) => sequencer.submit_answer(input).await,
            };

            match result {
                Ok(_) => {}
                Err(SequencerError::Validation(e)) => {
                    writeln!(self.out, "  ! {}: {}", e.field, e.message)?;
                }
                Err(SequencerError::SubmissionTransport(e)) => {
                    tracing::debug!(error = %e, "Submission failed, asking user to retry");
                    writeln!(
                        self.out,
                        "  ! We could not send your answers. Please try again."
                    )?;
                }
                Err(e) => writeln!(self.out, "  ! {e}")?,
            }
        }
    }

    fn show_step(&mut self, view: &StepView) -> std::io::Result<()> {
        writeln!(self.out)?;
        writeln!(
            self.out,
            "== Step {} of {} ==",
            view.step_index + 1,
            view.total_steps
        )?;
        writeln!(self.out, "  video: {}", view.media_ref)?;
        if let Some(question) = &view.question {
            writeln!(self.out, "  {question}")?;
        }
        Ok(())
    }

    fn show_completion(
        &mut self,
        title: &str,
        message: &str,
        booking_url: Option<&str>,
    ) -> std::io::Result<()> {
        writeln!(self.out, "  {title}")?;
        writeln!(self.out, "  {message}")?;
        if let Some(url) = booking_url {
            writeln!(self.out, "  Book a call: {url}")?;
        }
        self.out.flush()
    }

    /// Read the user's action for `control`. `None` when input ended.
    async fn read_action(&mut self, control: &Control) -> Result<Option<Action>, TerminalError> {
        let action = match control {
            Control::Continue { .. } => {
                self.prompt("Press Enter to continue")?;
                self.read_line().await?.map(|_| Action::Continue)
            }
            Control::Choice { options, .. } => {
                for (i, option) in options.iter().enumerate() {
                    writeln!(self.out, "  {}) {}", i + 1, option.label)?;
                }
                self.prompt("> ")?;
                self.read_line().await?.map(|line| {
                    Action::Answer(StepInput::Choice {
                        option_id: pick_option(options, &line),
                    })
                })
            }
            Control::TextInput {
                placeholder,
                multiline,
                ..
            } => {
                if let Some(hint) = placeholder {
                    writeln!(self.out, "  ({hint})")?;
                }
                let text = if *multiline {
                    writeln!(self.out, "  (finish with an empty line)")?;
                    self.read_paragraph().await?
                } else {
                    self.prompt("> ")?;
                    self.read_line().await?
                };
                text.map(|value| Action::Answer(StepInput::Text { value }))
            }
            Control::ContactForm { fields, .. } => self
                .read_contact(fields)
                .await?
                .map(|values| Action::Answer(StepInput::Contact { values })),
            Control::Completion { .. } => None,
        };
        Ok(action)
    }

    async fn read_contact(
        &mut self,
        fields: &[ContactField],
    ) -> Result<Option<BTreeMap<String, String>>, TerminalError> {
        let mut values = BTreeMap::new();
        for field in fields {
            let marker = if field.required { " *" } else { "" };
            self.prompt(&format!("{}{marker}: ", field.label))?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            values.insert(field.name.clone(), line);
        }
        Ok(Some(values))
    }

    /// Lines up to the first empty one, joined with newlines.
    async fn read_paragraph(&mut self) -> Result<Option<String>, TerminalError> {
        let mut lines = Vec::new();
        loop {
            match self.read_line().await? {
                Some(line) if line.trim().is_empty() => break,
                Some(line) => lines.push(line),
                None if lines.is_empty() => return Ok(None),
                None => break,
            }
        }
        Ok(Some(lines.join("\n")))
    }

    async fn read_line(&mut self) -> Result<Option<String>, TerminalError> {
        Ok(self.lines.next_line().await?)
    }

    fn prompt(&mut self, text: &str) -> std::io::Result<()> {
        write!(self.out, "  {text}")?;
        self.out.flush()
    }
}

/// Map what the user typed to an option id: a 1-based number, an id or a
/// label (case-insensitive). Anything else is passed through as typed and
/// rejected by the sequencer.
fn pick_option(options: &[ChoiceOption], typed: &str) -> String {
    let typed = typed.trim();
    if let Ok(n) = typed.parse::<usize>() {
        if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
            return option.id.clone();
        }
    }
    options
        .iter()
        .find(|o| o.id.eq_ignore_ascii_case(typed) || o.label.eq_ignore_ascii_case(typed))
        .map(|o| o.id.clone())
        .unwrap_or_else(|| typed.to_string())
}

/// Session id for a terminal run: reuse the one saved next to the progress
/// file when there is progress to resume, otherwise start a new session.
pub fn resume_or_start_session(
    progress_dir: &Path,
    has_progress: bool,
) -> std::io::Result<SessionId> {
    let path = progress_dir.join(SESSION_FILE);
    if has_progress {
        if let Ok(saved) = std::fs::read_to_string(&path) {
            let saved = saved.trim();
            if !saved.is_empty() {
                return Ok(SessionId::from_string(saved));
            }
        }
    }

    let session_id = SessionId::generate();
    std::fs::create_dir_all(progress_dir)?;
    std::fs::write(&path, session_id.as_str())?;
    Ok(session_id)
}

/// Print the admin viewer listing.
pub fn print_listing(out: &mut impl Write, listing: &SubmissionListing) -> std::io::Result<()> {
    writeln!(out, "Total: {} submissions", listing.total)?;
    for submission in &listing.submissions {
        writeln!(out)?;
        writeln!(
            out,
            "#{} {} ({})",
            submission.id.as_deref().unwrap_or("?"),
            submission.submitted_at.as_deref().unwrap_or("-"),
            submission.session_id.as_deref().unwrap_or("-"),
        )?;
        for field in &submission.fields {
            writeln!(out, "  {}: {}", field.key, field.value)?;
        }
    }
    Ok(())
}
