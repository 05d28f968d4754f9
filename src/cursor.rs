//! Cursor-style query interface over the job lifecycle.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::client::JobServiceApi;
use crate::errors::ClientError;
use crate::executor::QueryExecutor;
use crate::models::{generate_job_name, ClientConfig, Column, Row};
use crate::parser::SparkEvent;

/// A primitive value bound into a SQL statement before submission.
///
/// Coercion rules: numbers render as floating-point text, date/times as a
/// quoted `'YYYY-MM-DD HH:MM:SS.mmm'` literal, and everything else as a
/// single-quoted text literal of its printed form. Boolean-looking text gets
/// no special treatment.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Number(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl BindValue {
    fn render(&self) -> String {
        match self {
            BindValue::Number(n) => format!("{:?}", n),
            BindValue::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f")),
            BindValue::Text(s) => format!("'{}'", s),
        }
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Number(v)
    }
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Number(v as f64)
    }
}

impl From<i32> for BindValue {
    fn from(v: i32) -> Self {
        BindValue::Number(v as f64)
    }
}

impl From<NaiveDateTime> for BindValue {
    fn from(v: NaiveDateTime) -> Self {
        BindValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for BindValue {
    fn from(v: DateTime<Utc>) -> Self {
        BindValue::Timestamp(v.naive_utc())
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

impl From<bool> for BindValue {
    fn from(v: bool) -> Self {
        BindValue::Text(v.to_string())
    }
}

/// Substitute `%s` placeholders in order. Placeholder and binding counts
/// must match exactly.
fn substitute_bindings(sql: &str, bindings: &[BindValue]) -> Result<String, ClientError> {
    let placeholders = sql.matches("%s").count();
    if placeholders != bindings.len() {
        return Err(ClientError::Binding(format!(
            "SQL has {} placeholder(s) but {} binding(s) were supplied",
            placeholders,
            bindings.len()
        )));
    }

    let mut result = String::with_capacity(sql.len());
    let mut rest = sql;
    for binding in bindings {
        // Counts were checked above, so every binding finds a placeholder.
        if let Some(pos) = rest.find("%s") {
            result.push_str(&rest[..pos]);
            result.push_str(&binding.render());
            rest = &rest[pos + 2..];
        }
    }
    result.push_str(rest);
    Ok(result)
}

/// Holds the materialized schema and rows of the last execution and hands
/// them out either one row at a time or in bulk.
///
/// `execute` substitutes bindings into the SQL text client-side. That is
/// plain string substitution, kept for compatibility with the service's
/// job-based protocol: it is injection-prone, so never pass untrusted input
/// as SQL or bindings.
pub struct QueryCursor<C: JobServiceApi> {
    executor: QueryExecutor<C>,
    schema: Vec<Column>,
    rows: Vec<Row>,
    next_row: usize,
    last_job: Option<(String, i64)>,
}

impl<C: JobServiceApi> QueryCursor<C> {
    pub fn new(client: Arc<C>, config: Arc<ClientConfig>) -> Self {
        Self {
            executor: QueryExecutor::new(client, config),
            schema: Vec::new(),
            rows: Vec::new(),
            next_row: 0,
            last_job: None,
        }
    }

    /// Run a SQL statement end to end. Resolves only after the remote job
    /// reaches a terminal state; there is no way to cancel the job once
    /// submitted.
    pub async fn execute(&mut self, sql: &str, bindings: &[BindValue]) -> Result<(), ClientError> {
        let trimmed = sql.trim();
        let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed);
        let statement = if bindings.is_empty() {
            trimmed.to_string()
        } else {
            substitute_bindings(trimmed, bindings)?
        };

        let job_name = generate_job_name();
        let outcome = self.executor.run(&job_name, &statement).await?;

        self.schema = outcome.schema;
        self.rows = outcome.rows;
        self.next_row = 0;
        self.last_job = Some((job_name, outcome.run_id));
        Ok(())
    }

    /// The full row sequence of the last execution. Does not consume rows.
    pub fn fetch_all(&self) -> &[Row] {
        &self.rows
    }

    /// The next unconsumed row, or `None` once exhausted (and on every call
    /// after that).
    pub fn fetch_one(&mut self) -> Option<&Row> {
        let row = self.rows.get(self.next_row);
        if row.is_some() {
            self.next_row += 1;
        }
        row
    }

    /// Read-only view of the last execution's schema.
    pub fn description(&self) -> &[Column] {
        &self.schema
    }

    /// Release the materialized result. The remote job, if somehow still
    /// running, is not cancelled.
    pub fn close(&mut self) {
        self.schema.clear();
        self.rows.clear();
        self.next_row = 0;
    }

    /// Spark event records for the last execution's run.
    pub async fn spark_events(&self) -> Result<Vec<SparkEvent>, ClientError> {
        match &self.last_job {
            Some((job_name, run_id)) => self.executor.spark_events(job_name, *run_id).await,
            None => Err(ClientError::Validation(
                "No completed execution to fetch events for".to_string(),
            )),
        }
    }
}
