//! Drives one SQL statement through the full remote job lifecycle:
//! create namespace, upload resources, submit, run, poll to a terminal
//! state, fetch and parse output, clean up.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;

use crate::client::JobServiceApi;
use crate::errors::ClientError;
use crate::models::{ClientConfig, Column, DriverLogType, FileResource, JobRunState, Row, RunStatus};
use crate::parser::{self, LogOutput, SparkEvent};
use crate::timer::TaskTimers;

/// Everything one successful execution produces. Schema and rows are built
/// together from a single log fetch; there is no partially-populated state.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub schema: Vec<Column>,
    pub rows: Vec<Row>,
    pub run_id: i64,
}

/// What cleanup managed to delete. Logged for operators, never part of the
/// execution result: cleanup can fail without masking the primary outcome.
#[derive(Debug, Clone, Copy)]
struct CleanupOutcome {
    job_deleted: bool,
    namespace_deleted: bool,
}

enum TerminalState {
    Succeeded,
    Failed(JobRunState),
    TimedOut,
}

/// The wrapper script must open the SQL file at the path the service mounts
/// it under. Both sides derive the path from `RESOURCE_MOUNT_ROOT`, and this
/// check makes a drift fail loudly before submission instead of silently on
/// the cluster.
fn validate_mount_coupling(
    wrapper: &FileResource,
    sql_resource: &FileResource,
) -> Result<(), ClientError> {
    if wrapper.references(sql_resource) {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "Wrapper script does not reference mounted SQL file {}",
            sql_resource.mount_path()
        )))
    }
}

pub struct QueryExecutor<C: JobServiceApi> {
    client: Arc<C>,
    config: Arc<ClientConfig>,
}

impl<C: JobServiceApi> QueryExecutor<C> {
    pub fn new(client: Arc<C>, config: Arc<ClientConfig>) -> Self {
        Self { client, config }
    }

    /// Run `sql` as a remote job under `job_name` and return the parsed
    /// result. Resolves only once the job reaches a terminal state or the
    /// poll ceiling is hit; cleanup is attempted exactly once for every
    /// terminal state and never changes the outcome.
    pub async fn run(&self, job_name: &str, sql: &str) -> Result<QueryOutcome, ClientError> {
        let mut timers = TaskTimers::new();
        tracing::debug!("{}: Executing SQL statement:\n{}", job_name, sql);

        timers.start("create-resource");
        tracing::debug!("{}: Create resource namespace", job_name);
        self.client.create_resource(job_name).await?;
        timers.end("create-resource");

        let sql_resource = FileResource::sql(job_name, sql);
        let wrapper_resource = FileResource::wrapper(job_name, &sql_resource);
        validate_mount_coupling(&wrapper_resource, &sql_resource)?;

        timers.start("upload-resources");
        tracing::debug!("{}: Upload SQL resource {}", job_name, sql_resource.file_name);
        self.client.upload_resource(job_name, &sql_resource).await?;
        tracing::debug!(
            "{}: Upload wrapper resource {}",
            job_name,
            wrapper_resource.file_name
        );
        self.client
            .upload_resource(job_name, &wrapper_resource)
            .await?;
        timers.end("upload-resources");

        timers.start("submit-job");
        tracing::debug!("{}: Submit job", job_name);
        self.client
            .submit_job(job_name, job_name, &sql_resource, &wrapper_resource)
            .await?;
        timers.end("submit-job");

        timers.start("run-job");
        tracing::debug!("{}: Run job", job_name);
        let handle = self.client.run_job(job_name).await?;
        timers.end("run-job");

        timers.start("wait-for-result");
        let terminal = self.wait_for_terminal(job_name, handle.id).await?;
        timers.end("wait-for-result");

        let result = match terminal {
            TerminalState::Succeeded => {
                timers.start("fetch-output");
                let fetched = self.fetch_table(job_name, handle.id).await;
                timers.end("fetch-output");
                fetched
            }
            TerminalState::Failed(state) => {
                Err(self.failed_run_error(job_name, handle.id, state).await)
            }
            TerminalState::TimedOut => Err(ClientError::JobTimeout {
                job_name: job_name.to_string(),
                ceiling_secs: self.config.job_timeout_secs,
            }),
        };

        let cleanup = self.cleanup(job_name).await;
        tracing::debug!(
            "{}: Cleanup: job deleted={}, namespace deleted={}",
            job_name,
            cleanup.job_deleted,
            cleanup.namespace_deleted
        );
        timers.log_summary(job_name);

        result.map(|(schema, rows)| QueryOutcome {
            schema,
            rows,
            run_id: handle.id,
        })
    }

    /// Poll run status until terminal or the cumulative wait reaches the
    /// configured ceiling. A status-fetch transport failure propagates and
    /// aborts polling; only the scheduled re-check repeats.
    async fn wait_for_terminal(
        &self,
        job_name: &str,
        run_id: i64,
    ) -> Result<TerminalState, ClientError> {
        let mut waited_secs: u64 = 0;
        loop {
            let state = self.client.run_status(run_id).await?;
            tracing::debug!("{}: Current run status: {:?}", job_name, state.status);
            match state.status {
                RunStatus::Succeeded => return Ok(TerminalState::Succeeded),
                RunStatus::Failed => return Ok(TerminalState::Failed(state)),
                _ => {}
            }

            waited_secs += self.config.poll_wait_secs;
            if waited_secs >= self.config.job_timeout_secs {
                tracing::error!(
                    "{}: No terminal status after {} seconds",
                    job_name,
                    self.config.job_timeout_secs
                );
                return Ok(TerminalState::TimedOut);
            }
            tracing::debug!(
                "{}: Sleeping {} seconds before next status poll",
                job_name,
                self.config.poll_wait_secs
            );
            tokio::time::sleep(Duration::from_secs(self.config.poll_wait_secs)).await;
        }
    }

    /// Fetch one driver log stream and parse it with the parser matching
    /// its type.
    pub async fn fetch_output(
        &self,
        job_name: &str,
        run_id: i64,
        log_type: DriverLogType,
    ) -> Result<LogOutput, ClientError> {
        tracing::debug!("{}: Fetch {} output", job_name, log_type.as_str());
        let text = self.client.run_logs(run_id, log_type).await?;
        parser::parse_driver_log(log_type, &text)
    }

    async fn fetch_table(
        &self,
        job_name: &str,
        run_id: i64,
    ) -> Result<(Vec<Column>, Vec<Row>), ClientError> {
        match self
            .fetch_output(job_name, run_id, DriverLogType::Stdout)
            .await?
        {
            LogOutput::Table { schema, rows } => Ok((schema, rows)),
            // stdout always parses to the table variant
            _ => Ok((Vec::new(), Vec::new())),
        }
    }

    /// Build the failure error for a `failed` run. The stdout fetch is
    /// best-effort diagnostics; its own failure is logged and swallowed.
    async fn failed_run_error(
        &self,
        job_name: &str,
        run_id: i64,
        state: JobRunState,
    ) -> ClientError {
        let details = match self.client.run_logs(run_id, DriverLogType::Stdout).await {
            Ok(text) => {
                tracing::error!("{}: Failed job details: {}", job_name, text);
                Some(text)
            }
            Err(e) => {
                tracing::error!("{}: Could not fetch logs for failed run: {}", job_name, e);
                None
            }
        };
        ClientError::JobFailed {
            job_name: job_name.to_string(),
            status: state.raw,
            details,
        }
    }

    /// Delete the job and its resource namespace. Failures are logged and
    /// never escalated so they cannot mask the already-determined outcome.
    async fn cleanup(&self, job_name: &str) -> CleanupOutcome {
        let job_deleted = match self.client.delete_job(job_name).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}: Failed to delete job: {}", job_name, e);
                false
            }
        };
        let namespace_deleted = match self.client.delete_resource(job_name).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{}: Failed to delete resource namespace: {}", job_name, e);
                false
            }
        };
        CleanupOutcome {
            job_deleted,
            namespace_deleted,
        }
    }

    /// Fetch and parse the run's Spark event log, logging each event name
    /// with its UTC time.
    pub async fn spark_events(
        &self,
        job_name: &str,
        run_id: i64,
    ) -> Result<Vec<SparkEvent>, ClientError> {
        let events = match self
            .fetch_output(job_name, run_id, DriverLogType::Event)
            .await?
        {
            LogOutput::Events(events) => events,
            // the event stream always parses to the events variant
            _ => Vec::new(),
        };

        for event in &events {
            let when = chrono::Utc
                .timestamp_millis_opt(event.timestamp_ms)
                .single()
                .map(|dt| dt.format("%H:%M:%S%.3f").to_string())
                .unwrap_or_else(|| event.timestamp_ms.to_string());
            tracing::debug!(
                "{}: {:<40} {}",
                job_name,
                event.name.as_deref().unwrap_or("-"),
                when
            );
        }
        Ok(events)
    }
}
