use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Status of a job run as reported by the service. Only `Succeeded` and
/// `Failed` are terminal; anything else keeps the poll loop going.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Starting,
    Running,
    Succeeded,
    Failed,
    /// Any status string the service reports that we do not model.
    Unknown,
}

impl RunStatus {
    /// Parse a service status string. Unrecognized statuses map to
    /// `Unknown` and are treated as non-terminal by the poll loop.
    pub fn parse(status: &str) -> Self {
        match status {
            "starting" => RunStatus::Starting,
            "running" => RunStatus::Running,
            "succeeded" => RunStatus::Succeeded,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

/// Which driver log stream to fetch for a run. Selects both the request
/// path and the parser applied to the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverLogType {
    Stdout,
    Stderr,
    Event,
}

impl DriverLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverLogType::Stdout => "stdout",
            DriverLogType::Stderr => "stderr",
            DriverLogType::Event => "event",
        }
    }
}

/// Identifier returned when a job is triggered; used for all subsequent
/// status and log queries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRunHandle {
    pub id: i64,
}

/// One status poll result. The raw payload is kept verbatim so a failure can
/// be reported with everything the service said.
#[derive(Debug, Clone)]
pub struct JobRunState {
    pub status: RunStatus,
    pub raw: serde_json::Value,
}

impl JobRunState {
    pub fn from_payload(raw: serde_json::Value) -> Self {
        let status = raw
            .get("status")
            .and_then(|s| s.as_str())
            .map(RunStatus::parse)
            .unwrap_or(RunStatus::Unknown);
        Self { status, raw }
    }
}

/// A resource namespace mounted into the job's filesystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceMount {
    #[serde(rename = "dirPrefix")]
    pub dir_prefix: String,
    #[serde(rename = "resourceName")]
    pub resource_name: String,
}

/// Spark engine settings: the entry file, extra mounted files, and runtime
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SparkSpec {
    pub file: String,
    pub files: Vec<String>,
    pub conf: HashMap<String, String>,
}

/// Job submission payload. Built once per execution and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSpec {
    pub name: String,
    pub mounts: Vec<ResourceMount>,
    #[serde(rename = "type")]
    pub engine_type: String,
    pub spark: SparkSpec,
}

impl JobSpec {
    /// Build the spec for one execution: the namespace mounted at root, the
    /// wrapper script as entry point, the SQL file alongside it, and the
    /// interpreter pinned to python3.
    pub fn spark(job_name: &str, namespace: &str, wrapper_file: &str, sql_file: &str) -> Self {
        let mut conf = HashMap::new();
        conf.insert("spark.pyspark.python".to_string(), "python3".to_string());
        Self {
            name: job_name.to_string(),
            mounts: vec![ResourceMount {
                dir_prefix: "/".to_string(),
                resource_name: namespace.to_string(),
            }],
            engine_type: "spark".to_string(),
            spark: SparkSpec {
                file: wrapper_file.to_string(),
                files: vec![sql_file.to_string()],
                conf,
            },
        }
    }
}

/// Generate a job name from the current millisecond timestamp and a
/// zero-padded random suffix. Collision-resistant across concurrent
/// submissions from one process, not globally unique.
pub fn generate_job_name() -> String {
    let time_ms = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("sql-job-{}-{:08}", time_ms, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_parses_lowercase() {
        assert_eq!(RunStatus::parse("succeeded"), RunStatus::Succeeded);
        assert_eq!(RunStatus::parse("starting"), RunStatus::Starting);
        assert_eq!(RunStatus::parse("running"), RunStatus::Running);
        assert_eq!(RunStatus::parse("failed"), RunStatus::Failed);
    }

    #[test]
    fn test_run_status_unknown_fallback() {
        let status = RunStatus::parse("killed");
        assert_eq!(status, RunStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_run_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(RunStatus::Succeeded).expect("serialize"),
            serde_json::json!("succeeded")
        );
    }

    #[test]
    fn test_run_status_terminal() {
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
        assert!(!RunStatus::Starting.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn test_job_run_state_from_payload() {
        let state = JobRunState::from_payload(serde_json::json!({
            "id": 42,
            "status": "running",
            "job": "sql-job-1-00000001",
        }));
        assert_eq!(state.status, RunStatus::Running);
        assert_eq!(state.raw["id"], 42);
    }

    #[test]
    fn test_job_run_state_missing_status() {
        let state = JobRunState::from_payload(serde_json::json!({"id": 42}));
        assert_eq!(state.status, RunStatus::Unknown);
    }

    #[test]
    fn test_job_spec_wire_shape() {
        let spec = JobSpec::spark("job-1", "job-1", "wrapper.py", "query.sql");
        let json = serde_json::to_value(&spec).expect("serialize");

        assert_eq!(json["name"], "job-1");
        assert_eq!(json["type"], "spark");
        assert_eq!(json["mounts"][0]["dirPrefix"], "/");
        assert_eq!(json["mounts"][0]["resourceName"], "job-1");
        assert_eq!(json["spark"]["file"], "wrapper.py");
        assert_eq!(json["spark"]["files"][0], "query.sql");
        assert_eq!(json["spark"]["conf"]["spark.pyspark.python"], "python3");
    }

    #[test]
    fn test_generate_job_name_format() {
        let name = generate_job_name();
        assert!(name.starts_with("sql-job-"));
        let parts: Vec<&str> = name.rsplitn(2, '-').collect();
        let suffix = parts[0];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_job_name_distinct_suffixes() {
        // Suffixes are random in 0..1000; two hundred draws all landing on
        // the same value would mean the generator is broken.
        let names: Vec<String> = (0..200).map(|_| generate_job_name()).collect();
        let first_suffix = names[0].rsplit('-').next().unwrap().to_string();
        assert!(names
            .iter()
            .any(|n| n.rsplit('-').next().unwrap() != first_suffix));
    }
}
