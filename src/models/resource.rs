use chrono::Utc;

/// Where the service mounts a root-prefixed resource namespace inside the
/// driver container. The wrapper script reads the SQL file from here, so the
/// submission side must mount the namespace at `/` for the paths to line up.
pub const RESOURCE_MOUNT_ROOT: &str = "/app/mount/";

/// Maximum rows the wrapper script asks Spark to print. Results beyond this
/// are silently dropped by the remote `df.show` call.
pub const MAX_RESULT_ROWS: u32 = 1_000_000;

/// A named file uploaded into a job's resource namespace. Immutable once
/// built; owned by the execution that created it and deleted with it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileResource {
    pub file_name: String,
    pub content: Vec<u8>,
    pub job_name: String,
}

impl FileResource {
    /// Wrap raw SQL text as an uploadable resource named
    /// `<job_name>-<millis>.sql`.
    pub fn sql(job_name: &str, sql: &str) -> Self {
        let time_ms = Utc::now().timestamp_millis();
        Self {
            file_name: format!("{}-{}.sql", job_name, time_ms),
            content: sql.as_bytes().to_vec(),
            job_name: job_name.to_string(),
        }
    }

    /// Generate the PySpark wrapper that loads the mounted SQL file, runs it
    /// against a Hive-enabled session, and prints the result table to stdout
    /// untruncated.
    pub fn wrapper(job_name: &str, sql_resource: &FileResource) -> Self {
        let time_ms = Utc::now().timestamp_millis();
        let script = format!(
            "import pyspark\n\
             from pyspark.sql import SparkSession\n\
             spark=SparkSession.builder.appName('{}').enableHiveSupport().getOrCreate()\n\
             sql=open('{}', 'r').read()\n\
             df = spark.sql(sql)\n\
             df.show(n={},truncate=False)\n",
            job_name,
            sql_resource.mount_path(),
            MAX_RESULT_ROWS,
        );
        Self {
            file_name: format!("{}-{}.py", job_name, time_ms),
            content: script.into_bytes(),
            job_name: job_name.to_string(),
        }
    }

    /// Absolute path of this file inside the driver container once the
    /// namespace is mounted at root.
    pub fn mount_path(&self) -> String {
        format!("{}{}", RESOURCE_MOUNT_ROOT, self.file_name)
    }

    /// True if this resource's content references `other`'s mount path.
    /// Used to validate the wrapper/SQL coupling before submission.
    pub fn references(&self, other: &FileResource) -> bool {
        let needle = other.mount_path();
        String::from_utf8_lossy(&self.content).contains(&needle)
    }
}
