use super::status::JobStatus;
use chrono::{DateTime, Utc};
use rusqlite::{Row, Result as SqlResult};

/// One row per coordinator invocation of a policy (spec §3, §6-D). This is
/// the audit trail a caller or operator reads to see what a scan actually
/// did, independent of the tracing log stream.
#[derive(Debug, Clone)]
pub struct JobLog {
    pub id: i64,
    pub job_name: String,
    pub job_type: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub items_processed: i64,
    pub items_affected: i64,
    pub error_message: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobLog {
    pub fn from_row(row: &Row) -> SqlResult<Self> {
        let status_str: String = row.get("status")?;
        Ok(JobLog {
            id: row.get("id")?,
            job_name: row.get("job_name")?,
            job_type: row.get("job_type")?,
            started_at: row.get("started_at")?,
            finished_at: row.get("finished_at")?,
            status: JobStatus::from_str(&status_str).unwrap_or(JobStatus::Running),
            items_processed: row.get("items_processed")?,
            items_affected: row.get("items_affected")?,
            error_message: row.get("error_message")?,
            details: row.get("details")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}
