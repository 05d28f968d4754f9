use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A single network call failed. Never retried; the current lifecycle
    /// transition is aborted.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote job reported `failed`. Carries the raw status payload and
    /// whatever stdout could be fetched for diagnosis.
    #[error("Job '{job_name}' failed with status {status}")]
    JobFailed {
        job_name: String,
        status: serde_json::Value,
        details: Option<String>,
    },

    /// The poll ceiling was reached before the run hit a terminal state.
    #[error("Job '{job_name}' did not finish within {ceiling_secs} seconds")]
    JobTimeout { job_name: String, ceiling_secs: u64 },

    /// Malformed JSON in an event log line.
    #[error("Event log parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Type inference classified a column from the first row, but a later
    /// row's value could not be converted.
    #[error("Cannot convert '{value}' in column '{column}' to {expected}")]
    Conversion {
        column: String,
        value: String,
        expected: &'static str,
    },

    /// The wrapper script does not reference the SQL resource's mount path.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Binding count does not match the placeholders in the SQL text.
    #[error("Binding error: {0}")]
    Binding(String),
}
