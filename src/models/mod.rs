pub mod config;
pub mod job;
pub mod resource;
pub mod schema;

pub use config::ClientConfig;
pub use job::{
    generate_job_name, DriverLogType, JobRunHandle, JobRunState, JobSpec, ResourceMount,
    RunStatus, SparkSpec,
};
pub use resource::{FileResource, MAX_RESULT_ROWS, RESOURCE_MOUNT_ROOT};
pub use schema::{Column, ColumnType, Row, Value};
