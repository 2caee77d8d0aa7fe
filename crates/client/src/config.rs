use std::path::PathBuf;
use std::time::Duration;

use vidform_core::gate::DEFAULT_GATE_DELAY;

/// Terminal client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storage service.
    pub submit_api_url: String,
    /// JSON document describing the form's steps.
    pub form_steps_path: PathBuf,
    /// Directory holding the saved-progress file.
    pub progress_dir: PathBuf,
    /// Booking link shown on the completion step when the step has none.
    pub booking_url: Option<String>,
    /// Continue gate delay.
    pub gate_delay: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var           | Default                   |
    /// |-------------------|---------------------------|
    /// | `SUBMIT_API_URL`  | `http://localhost:3000`   |
    /// | `FORM_STEPS_PATH` | `demos/form_steps.json`   |
    /// | `PROGRESS_DIR`    | `.vidform`                |
    /// | `BOOKING_URL`     | unset                     |
    /// | `GATE_DELAY_MS`   | `1000`                    |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let gate_delay = non_empty("GATE_DELAY_MS")
            .and_then(|v| match v.trim().parse::<u64>() {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(_) => {
                    tracing::warn!(value = %v, "GATE_DELAY_MS is not a valid integer, using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_GATE_DELAY);

        Self {
            submit_api_url: non_empty("SUBMIT_API_URL")
                .unwrap_or_else(|| "http://localhost:3000".into()),
            form_steps_path: non_empty("FORM_STEPS_PATH")
                .unwrap_or_else(|| "demos/form_steps.json".into())
                .into(),
            progress_dir: non_empty("PROGRESS_DIR")
                .unwrap_or_else(|| ".vidform".into())
                .into(),
            booking_url: non_empty("BOOKING_URL"),
            gate_delay,
        }
    }
}
