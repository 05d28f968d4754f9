//! Typed operations against the job-execution service.
//!
//! Each operation is one HTTP call. Nothing here retries: transport and
//! HTTP-level failures map to [`ClientError::Transport`] and propagate to
//! the executor, which owns the only retry-like behavior (status polling).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart;

use crate::errors::ClientError;
use crate::models::{
    ClientConfig, DriverLogType, FileResource, JobRunHandle, JobRunState, JobSpec,
};

/// Operations the orchestration layer needs from the job service. Kept as a
/// trait so the lifecycle can be driven against a scripted fake in tests.
#[async_trait]
pub trait JobServiceApi: Send + Sync {
    /// Create a `files`-type resource namespace.
    async fn create_resource(&self, name: &str) -> Result<(), ClientError>;

    /// Delete a resource namespace and everything uploaded into it.
    async fn delete_resource(&self, name: &str) -> Result<(), ClientError>;

    /// Upload one file into a namespace.
    async fn upload_resource(
        &self,
        namespace: &str,
        resource: &FileResource,
    ) -> Result<(), ClientError>;

    /// Submit the job definition referencing this execution's two resources.
    async fn submit_job(
        &self,
        job_name: &str,
        namespace: &str,
        sql_resource: &FileResource,
        wrapper_resource: &FileResource,
    ) -> Result<(), ClientError>;

    /// Trigger execution; the returned handle keys all status/log queries.
    async fn run_job(&self, job_name: &str) -> Result<JobRunHandle, ClientError>;

    /// Fetch the current run status along with the raw payload.
    async fn run_status(&self, run_id: i64) -> Result<JobRunState, ClientError>;

    /// Fetch one driver log stream as raw text. Waits the configured settle
    /// delay first: logs index asynchronously after a run reaches a terminal
    /// status and may not be available immediately.
    async fn run_logs(&self, run_id: i64, log_type: DriverLogType) -> Result<String, ClientError>;

    /// Delete the job definition.
    async fn delete_job(&self, job_name: &str) -> Result<(), ClientError>;
}

/// reqwest-backed [`JobServiceApi`] implementation. One instance is safe to
/// share across independent cursors; no per-request state is kept.
pub struct JobServiceClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl JobServiceClient {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.access_token);
        let auth = HeaderValue::from_str(&bearer)
            .map_err(|e| ClientError::Validation(format!("Invalid access token: {}", e)))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_root(), path)
    }
}

#[async_trait]
impl JobServiceApi for JobServiceClient {
    async fn create_resource(&self, name: &str) -> Result<(), ClientError> {
        let body = serde_json::json!({
            "hidden": false,
            "name": name,
            "type": "files",
        });
        self.http
            .post(self.url("resources"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_resource(&self, name: &str) -> Result<(), ClientError> {
        self.http
            .delete(self.url(&format!("resources/{}", name)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn upload_resource(
        &self,
        namespace: &str,
        resource: &FileResource,
    ) -> Result<(), ClientError> {
        let part = multipart::Part::bytes(resource.content.clone())
            .file_name(resource.file_name.clone())
            .mime_str("text/plain")?;
        let form = multipart::Form::new().part("file", part);

        self.http
            .put(self.url(&format!(
                "resources/{}/{}",
                namespace, resource.file_name
            )))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn submit_job(
        &self,
        job_name: &str,
        namespace: &str,
        sql_resource: &FileResource,
        wrapper_resource: &FileResource,
    ) -> Result<(), ClientError> {
        let spec = JobSpec::spark(
            job_name,
            namespace,
            &wrapper_resource.file_name,
            &sql_resource.file_name,
        );
        self.http
            .post(self.url("jobs"))
            .json(&spec)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn run_job(&self, job_name: &str) -> Result<JobRunHandle, ClientError> {
        let handle = self
            .http
            .post(self.url(&format!("jobs/{}/run", job_name)))
            .json(&serde_json::json!({}))
            .send()
            .await?
            .error_for_status()?
            .json::<JobRunHandle>()
            .await?;
        Ok(handle)
    }

    async fn run_status(&self, run_id: i64) -> Result<JobRunState, ClientError> {
        let payload = self
            .http
            .get(self.url(&format!("job-runs/{}", run_id)))
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;
        Ok(JobRunState::from_payload(payload))
    }

    async fn run_logs(&self, run_id: i64, log_type: DriverLogType) -> Result<String, ClientError> {
        tokio::time::sleep(Duration::from_secs(self.config.log_settle_secs)).await;

        let text = self
            .http
            .get(self.url(&format!("job-runs/{}/logs", run_id)))
            .query(&[
                ("type", format!("driver/{}", log_type.as_str())),
                ("follow", "true".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn delete_job(&self, job_name: &str) -> Result<(), ClientError> {
        self.http
            .delete(self.url(&format!("jobs/{}", job_name)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_base(base: &str) -> JobServiceClient {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            access_token: "secret".to_string(),
            ..ClientConfig::default()
        };
        JobServiceClient::new(Arc::new(config)).expect("client")
    }

    #[test]
    fn test_url_joins_with_trailing_slash() {
        let client = client_with_base("https://cde.example.com/api/v1");
        assert_eq!(
            client.url("jobs/j-1/run"),
            "https://cde.example.com/api/v1/jobs/j-1/run"
        );

        let client = client_with_base("https://cde.example.com/api/v1/");
        assert_eq!(client.url("resources"), "https://cde.example.com/api/v1/resources");
    }

    #[test]
    fn test_new_rejects_unprintable_token() {
        let config = ClientConfig {
            access_token: "bad\ntoken".to_string(),
            ..ClientConfig::default()
        };
        match JobServiceClient::new(Arc::new(config)) {
            Err(ClientError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_log_type_query_fragment() {
        assert_eq!(DriverLogType::Stdout.as_str(), "stdout");
        assert_eq!(DriverLogType::Stderr.as_str(), "stderr");
        assert_eq!(DriverLogType::Event.as_str(), "event");
    }
}
