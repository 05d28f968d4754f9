//! Run SQL on a remote Spark cluster through a batch job-execution API.
//!
//! The job service was never designed to return query results: it accepts
//! uploaded files, runs them as managed Spark jobs, and exposes only run
//! status and raw console logs. This crate packages a SQL statement and a
//! PySpark wrapper script as job resources, drives the job through a
//! bounded polling loop, and parses the driver's box-drawn stdout table
//! back into a typed result set behind a cursor-style interface.

pub mod cli;
pub mod client;
pub mod cursor;
pub mod errors;
pub mod executor;
pub mod models;
pub mod parser;
pub mod timer;

pub use client::{JobServiceApi, JobServiceClient};
pub use cursor::{BindValue, QueryCursor};
pub use errors::ClientError;
pub use executor::{QueryExecutor, QueryOutcome};
pub use models::{ClientConfig, Column, ColumnType, DriverLogType, RunStatus, Value};
pub use parser::{LogOutput, SparkEvent};
