//! `vidform-cli` -- terminal driver for the video form.
//!
//! Walks the form step by step on stdin/stdout, saving progress after every
//! change so an interrupted run resumes where it stopped, and submits the
//! answers to the storage service. `vidform-cli submissions` prints the
//! stored submissions instead.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default                 | Description                          |
//! |-------------------|----------|-------------------------|--------------------------------------|
//! | `SUBMIT_API_URL`  | no       | `http://localhost:3000` | Storage service base URL             |
//! | `FORM_STEPS_PATH` | no       | `demos/form_steps.json` | Step registry document               |
//! | `PROGRESS_DIR`    | no       | `.vidform`              | Where progress and session id live   |
//! | `BOOKING_URL`     | no       | --                      | Fallback booking link on completion  |
//! | `GATE_DELAY_MS`   | no       | `1000`                  | Continue gate delay                  |

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidform_client::api::HttpSubmissionClient;
use vidform_client::config::ClientConfig;
use vidform_client::terminal::{self, RunOutcome, Terminal};
use vidform_core::pagination::DEFAULT_LIST_LIMIT;
use vidform_core::progress::{FileProgressStore, ProgressStore};
use vidform_core::sequencer::Sequencer;
use vidform_core::steps::StepRegistry;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so they never interleave with the form on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidform_client=warn,vidform_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    let api = HttpSubmissionClient::new(config.submit_api_url.clone());

    if std::env::args().nth(1).as_deref() == Some("submissions") {
        let listing = api
            .list_submissions(DEFAULT_LIST_LIMIT)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to fetch submissions");
                std::process::exit(1);
            });
        if let Err(e) = terminal::print_listing(&mut std::io::stdout(), &listing) {
            tracing::error!(error = %e, "Failed to print submissions");
            std::process::exit(1);
        }
        return;
    }

    let registry = StepRegistry::from_path(&config.form_steps_path)
        .unwrap_or_else(|e| {
            tracing::error!(
                path = %config.form_steps_path.display(),
                error = %e,
                "Failed to load form steps",
            );
            std::process::exit(1);
        })
        .with_default_booking_ref(config.booking_url.clone());

    let store = FileProgressStore::new(&config.progress_dir);
    let session_id = terminal::resume_or_start_session(&config.progress_dir, store.load().is_some())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to prepare the session");
            std::process::exit(1);
        });

    tracing::info!(
        session_id = %session_id,
        steps = registry.len(),
        api_url = %config.submit_api_url,
        "Starting vidform-cli",
    );

    let sequencer = Sequencer::initialize(
        Arc::new(registry),
        session_id,
        store,
        api,
        config.gate_delay,
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut terminal = Terminal::new(stdin, std::io::stdout());

    match terminal.run(&sequencer).await {
        Ok(RunOutcome::Completed) => {}
        Ok(RunOutcome::InputClosed { step_index }) => {
            println!();
            println!("Progress saved at step {}. Run again to resume.", step_index + 1);
        }
        Err(e) => {
            tracing::error!(error = %e, "Terminal session failed");
            std::process::exit(1);
        }
    }
}
